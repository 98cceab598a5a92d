//! Push command - Publish a local directory as a repository
//!
//! Provides the `reposync push` CLI command which:
//! 1. Builds sync options from the configuration and command-line flags
//! 2. Loads the directory as a project, honoring ignore globs
//! 3. Runs the sync engine with Ctrl+C wired to graceful cancellation
//! 4. Prints the per-file report

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use reposync_core::domain::{
    Committer, ConflictPolicy, FileOutcome, OwnerLogin, SyncOptions, SyncOutcome, SyncReport,
    UploadAction,
};
use reposync_sync::{ProjectSyncService, SyncOrchestrator};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{connector, credential_provider};
use crate::output::{get_formatter, plural, OutputFormatter};
use crate::project_dir::DirectoryProjectStore;
use crate::AppContext;

#[derive(Debug, Args)]
pub struct PushCommand {
    /// Directory to publish
    pub dir: PathBuf,

    /// Repository name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Repository description
    #[arg(long)]
    pub description: Option<String>,

    /// Account or organization to create the repository under
    #[arg(long)]
    pub owner: Option<OwnerLogin>,

    /// Create the repository as private
    #[arg(long)]
    pub private: bool,

    /// Maximum number of parallel uploads
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// What to do if the repository already exists: fail | reuse-existing
    #[arg(long)]
    pub on_conflict: Option<ConflictPolicy>,

    /// Commit message template; {path} and {project} are substituted
    #[arg(long)]
    pub message: Option<String>,

    /// Branch to commit to (defaults to the repository's default branch)
    #[arg(long)]
    pub branch: Option<String>,

    /// Committer name (requires --committer-email)
    #[arg(long, requires = "committer_email")]
    pub committer_name: Option<String>,

    /// Committer email (requires --committer-name)
    #[arg(long, requires = "committer_name")]
    pub committer_email: Option<String>,

    /// Only push these files (relative paths, repeatable)
    #[arg(long = "only", value_name = "FILE")]
    pub only: Vec<String>,

    /// Additional ignore glob (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,
}

impl PushCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let config = &ctx.config;
        let options = self.sync_options(ctx)?;

        let ignore: Vec<&str> = config
            .sync
            .ignore
            .iter()
            .chain(&self.ignore)
            .map(String::as_str)
            .collect();
        let store = DirectoryProjectStore::new(&ignore)?.with_owner(self.owner.clone());

        let orchestrator = SyncOrchestrator::from_config(Arc::new(connector(config)), config);
        let service = ProjectSyncService::new(Arc::new(store), credential_provider(), orchestrator);

        let cancel = CancellationToken::new();
        let signal_task = tokio::spawn(cancel_on_interrupt(cancel.clone()));

        let key = self.dir.to_string_lossy();
        info!(dir = %key, files = self.only.len(), "Starting push");
        formatter.info(&format!("Pushing {}...", self.dir.display()));

        let result = if self.only.is_empty() {
            service.sync_project(&key, &options, cancel).await
        } else {
            service
                .sync_project_files(&key, &self.only, &options, cancel)
                .await
        };
        signal_task.abort();
        let report = result?;

        if ctx.format.is_json() {
            let json = serde_json::to_value(&report).context("Failed to serialize report")?;
            formatter.print_json(&json);
        } else {
            self.print_report(&report, &*formatter);
        }

        match report.overall_outcome {
            SyncOutcome::Complete => Ok(()),
            SyncOutcome::Partial => bail!(
                "{} of {} file{} failed",
                report.failed_count(),
                report.file_results.len(),
                plural(report.file_results.len())
            ),
            SyncOutcome::Aborted => match &report.resolution_error {
                Some(e) => bail!("Sync aborted: {e}"),
                None => bail!("Sync aborted"),
            },
        }
    }

    /// Configuration defaults overridden by the flags that were given
    fn sync_options(&self, ctx: &AppContext) -> Result<SyncOptions> {
        let mut options = ctx.config.sync_options();
        options.repo_name = self.name.clone();
        options.description = self.description.clone();
        options.is_private = self.private;
        options.branch = self.branch.clone();
        if let Some(n) = self.concurrency {
            options.concurrency = n;
        }
        if let Some(policy) = self.on_conflict {
            options.on_conflict = policy;
        }
        if let Some(template) = &self.message {
            options.commit_message = Some(template.clone());
        }
        if let (Some(name), Some(email)) = (&self.committer_name, &self.committer_email) {
            options.committer =
                Some(Committer::new(name.clone(), email.clone()).context("Invalid committer")?);
        }
        Ok(options)
    }

    fn print_report(&self, report: &SyncReport, formatter: &dyn OutputFormatter) {
        let Some(repository) = &report.repository else {
            if let Some(e) = &report.resolution_error {
                formatter.error(&e.to_string());
            }
            return;
        };

        let verb = if repository.created { "Created" } else { "Using existing" };
        formatter.success(&format!("{verb} repository {}", repository.full_name()));
        formatter.info(&repository.html_url);

        for result in &report.file_results {
            match (result.outcome, result.action) {
                (FileOutcome::Succeeded, Some(action)) => {
                    formatter.info(&format!("{:<10} {}", action_label(action), result.file_name));
                }
                (FileOutcome::Succeeded, None) => {
                    formatter.info(&format!("{:<10} {}", "done", result.file_name));
                }
                (FileOutcome::Failed, _) => formatter.warn(&format!(
                    "{}: {} ({} attempt{})",
                    result.file_name,
                    result.error_detail.as_deref().unwrap_or("failed"),
                    result.attempts,
                    plural(result.attempts as usize)
                )),
            }
        }

        let total = report.file_results.len();
        let elapsed = report.finished_at - report.started_at;
        formatter.info(&format!(
            "{} created, {} updated, {} unchanged, {} failed ({} file{} in {:.1}s)",
            report.count_action(UploadAction::Created),
            report.count_action(UploadAction::Updated),
            report.count_action(UploadAction::Unchanged),
            report.failed_count(),
            total,
            plural(total),
            elapsed.num_milliseconds() as f64 / 1000.0
        ));

        let failed = report.failed_file_names();
        if !failed.is_empty() {
            let only: Vec<String> = failed.iter().map(|f| format!("--only {f:?}")).collect();
            formatter.info(&format!(
                "Retry with: reposync push {} {}",
                self.dir.display(),
                only.join(" ")
            ));
        }
    }
}

fn action_label(action: UploadAction) -> &'static str {
    match action {
        UploadAction::Created => "created",
        UploadAction::Updated => "updated",
        UploadAction::Unchanged => "unchanged",
    }
}

/// Cancels `token` on SIGINT or SIGTERM
async fn cancel_on_interrupt(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Interrupted, cancelling remaining uploads"),
        _ = terminate => warn!("Terminated, cancelling remaining uploads"),
    }

    token.cancel();
}
