//! Sync orchestration
//!
//! The [`SyncOrchestrator`] is the engine's entry point. One call:
//!
//! 1. **Validate** the options against the project
//! 2. **Connect** with the caller's credentials and determine the owner
//! 3. **Resolve** the target repository (once; retries never re-resolve)
//! 4. **Upload** every file through a bounded worker pool
//! 5. **Report** the per-file results in project order
//!
//! Failure before step 4 aborts the sync with no upload attempted. After
//! that, failures are scoped to the file they happened on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use reposync_core::config::Config;
use reposync_core::domain::{
    Credentials, FileSyncResult, Project, ProjectFile, RemoteRepository, ResolutionError,
    SyncId, SyncOptions, SyncReport,
};
use reposync_core::ports::{IRemoteConnector, IRemoteRepoClient};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::resolver::{resolution_failure, RepositoryResolver};
use crate::retry::RetryPolicy;
use crate::uploader::{CommitMetadata, ContentUploader};

/// Detail recorded for a file whose worker died before reporting it
const WORKER_LOST_DETAIL: &str = "upload task aborted";

/// Synchronizes projects into remote repositories
pub struct SyncOrchestrator {
    connector: Arc<dyn IRemoteConnector>,
    retry: RetryPolicy,
    auto_init: bool,
    default_description: Option<String>,
}

impl SyncOrchestrator {
    pub fn new(connector: Arc<dyn IRemoteConnector>) -> Self {
        Self {
            connector,
            retry: RetryPolicy::default(),
            auto_init: true,
            default_description: None,
        }
    }

    /// Creates an orchestrator using the `retry`, `remote` and `sync` config sections
    pub fn from_config(connector: Arc<dyn IRemoteConnector>, config: &Config) -> Self {
        Self::new(connector)
            .with_retry_policy(RetryPolicy::from(&config.retry))
            .with_auto_init(config.remote.auto_init)
            .with_default_description(config.sync.default_description.clone())
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_auto_init(mut self, auto_init: bool) -> Self {
        self.auto_init = auto_init;
        self
    }

    /// Description used when neither the options nor the project carry one
    pub fn with_default_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.default_description = Some(description).filter(|d| !d.trim().is_empty());
        self
    }

    /// Synchronizes `project` into a remote repository
    ///
    /// Never fails: every failure is recorded in the returned report.
    pub async fn sync(
        &self,
        project: &Project,
        credentials: &Credentials,
        options: &SyncOptions,
    ) -> SyncReport {
        self.sync_with_cancellation(project, credentials, options, CancellationToken::new())
            .await
    }

    /// Like [`sync`](Self::sync), stopping early when `cancel` fires
    ///
    /// Uploads in flight finish (without further retries), no new file is
    /// dispatched, and every file never attempted is reported as cancelled.
    #[tracing::instrument(skip_all, fields(sync_id = tracing::field::Empty, project = %project.name()))]
    pub async fn sync_with_cancellation(
        &self,
        project: &Project,
        credentials: &Credentials,
        options: &SyncOptions,
        cancel: CancellationToken,
    ) -> SyncReport {
        let sync_id = SyncId::new();
        let started_at = Utc::now();
        tracing::Span::current().record("sync_id", tracing::field::display(sync_id));
        info!(files = project.files().len(), "Starting sync");

        let (client, repository) = match self.resolve(project, credentials, options).await {
            Ok(resolved) => resolved,
            Err(err) => {
                error!(error = %err, "Sync aborted");
                return SyncReport::aborted(sync_id, started_at, err);
            }
        };

        let uploader = Arc::new(ContentUploader::new(client, self.retry));
        let file_results = run_uploads(uploader, repository.clone(), project, options, cancel).await;

        let report = SyncReport::from_results(sync_id, started_at, repository, file_results);
        info!(
            outcome = %report.overall_outcome,
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            "Sync finished"
        );
        report
    }

    /// Steps 1 to 3: everything that must succeed before any upload
    async fn resolve(
        &self,
        project: &Project,
        credentials: &Credentials,
        options: &SyncOptions,
    ) -> Result<(Arc<dyn IRemoteRepoClient>, RemoteRepository), ResolutionError> {
        let name = options
            .validate(project.name())
            .map_err(|e| ResolutionError::InvalidOptions {
                reason: e.to_string(),
            })?;

        let client = self
            .connector
            .connect(credentials)
            .await
            .map_err(resolution_failure)?;

        let owner = match project.owner() {
            Some(owner) => owner.clone(),
            None => {
                let owner = client
                    .authenticated_owner()
                    .await
                    .map_err(resolution_failure)?;
                debug!(%owner, "Using authenticated user as owner");
                owner
            }
        };

        let description = options
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| project.description())
            .or(self.default_description.as_deref());

        let repository = RepositoryResolver::new(Arc::clone(&client))
            .with_auto_init(self.auto_init)
            .resolve(
                &owner,
                &name,
                description,
                options.is_private,
                options.on_conflict,
            )
            .await?;

        Ok((client, repository))
    }
}

/// Uploads every file of `project` with at most `options.concurrency` in flight
///
/// Results are returned in project order regardless of completion order.
async fn run_uploads(
    uploader: Arc<ContentUploader>,
    repository: RemoteRepository,
    project: &Project,
    options: &SyncOptions,
    cancel: CancellationToken,
) -> Vec<FileSyncResult> {
    let jobs: Arc<Vec<(ProjectFile, CommitMetadata)>> = Arc::new(
        project
            .files()
            .iter()
            .map(|file| (file.clone(), commit_metadata(file, project.name(), options)))
            .collect(),
    );
    let repository = Arc::new(repository);
    let next = Arc::new(AtomicUsize::new(0));
    let workers = options.concurrency.min(jobs.len());
    debug!(workers, files = jobs.len(), "Dispatching uploads");

    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, FileSyncResult)>();
    let mut set = JoinSet::new();
    for worker in 0..workers {
        let jobs = Arc::clone(&jobs);
        let uploader = Arc::clone(&uploader);
        let repository = Arc::clone(&repository);
        let next = Arc::clone(&next);
        let cancel = cancel.clone();
        let tx = tx.clone();

        set.spawn(
            async move {
                loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some((file, commit)) = jobs.get(index) else {
                        break;
                    };
                    if cancel.is_cancelled() {
                        debug!("Cancelled, not dispatching further files");
                        break;
                    }
                    let result = uploader.upload(&repository, file, commit, &cancel).await;
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                }
            }
            .instrument(info_span!("upload_worker", worker)),
        );
    }
    drop(tx);

    let mut slots: Vec<Option<FileSyncResult>> = vec![None; jobs.len()];
    while let Some((index, result)) = rx.recv().await {
        slots[index] = Some(result);
    }
    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Upload worker terminated abnormally");
        }
    }

    let cancelled = cancel.is_cancelled();
    slots
        .into_iter()
        .zip(jobs.iter())
        .map(|(slot, (file, _))| {
            slot.unwrap_or_else(|| {
                if cancelled {
                    FileSyncResult::cancelled(file.name())
                } else {
                    warn!(file = file.name(), "No result recorded for file");
                    FileSyncResult::failed(file.name(), WORKER_LOST_DETAIL, 0)
                }
            })
        })
        .collect()
}

fn commit_metadata(file: &ProjectFile, project_name: &str, options: &SyncOptions) -> CommitMetadata {
    // An unmappable name fails in the uploader; the message is never used
    let message = file
        .remote_path()
        .map(|path| options.commit_message_for(&path, project_name))
        .unwrap_or_default();
    CommitMetadata {
        message,
        committer: options.committer.clone(),
        branch: options.branch.clone(),
    }
}
