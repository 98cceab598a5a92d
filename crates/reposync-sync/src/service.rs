//! Project sync service
//!
//! Composes a project store, a credential provider and the
//! [`SyncOrchestrator`] into the operation callers actually want: "sync the
//! project stored under this key as the current user".

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reposync_core::domain::{Credentials, Project, SyncOptions, SyncReport};
use reposync_core::ports::{ICredentialProvider, IProjectStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::orchestrator::SyncOrchestrator;

/// Loads projects and credentials, then runs the sync engine
pub struct ProjectSyncService {
    store: Arc<dyn IProjectStore>,
    credentials: Arc<dyn ICredentialProvider>,
    orchestrator: SyncOrchestrator,
}

impl ProjectSyncService {
    pub fn new(
        store: Arc<dyn IProjectStore>,
        credentials: Arc<dyn ICredentialProvider>,
        orchestrator: SyncOrchestrator,
    ) -> Self {
        Self {
            store,
            credentials,
            orchestrator,
        }
    }

    /// Synchronizes the project stored under `key`
    ///
    /// # Errors
    /// Returns error if the project cannot be loaded or no credentials are
    /// available. Sync failures are reported in the [`SyncReport`] instead.
    pub async fn sync_project(
        &self,
        key: &str,
        options: &SyncOptions,
        cancel: CancellationToken,
    ) -> Result<SyncReport> {
        let project = self.load(key).await?;
        let credentials = self.credentials().await?;
        Ok(self
            .orchestrator
            .sync_with_cancellation(&project, &credentials, options, cancel)
            .await)
    }

    /// Synchronizes only the named files of the project stored under `key`
    ///
    /// File names are matched exactly against the project's file names.
    ///
    /// # Errors
    /// Returns error if `names` is empty or names a file the project does not
    /// contain, in addition to the errors of [`sync_project`](Self::sync_project)
    pub async fn sync_project_files(
        &self,
        key: &str,
        names: &[String],
        options: &SyncOptions,
        cancel: CancellationToken,
    ) -> Result<SyncReport> {
        if names.is_empty() {
            bail!("No files selected");
        }

        let mut project = self.load(key).await?;
        restrict_to(&mut project, names)?;
        let credentials = self.credentials().await?;
        Ok(self
            .orchestrator
            .sync_with_cancellation(&project, &credentials, options, cancel)
            .await)
    }

    /// Re-runs a sync for the files that failed in `previous`
    ///
    /// # Returns
    /// `None` if nothing failed in `previous`
    pub async fn retry_failed(
        &self,
        key: &str,
        previous: &SyncReport,
        options: &SyncOptions,
        cancel: CancellationToken,
    ) -> Result<Option<SyncReport>> {
        let failed = previous.failed_file_names();
        if failed.is_empty() {
            debug!("No failed files to retry");
            return Ok(None);
        }
        info!(files = failed.len(), "Retrying failed files");
        self.sync_project_files(key, &failed, options, cancel)
            .await
            .map(Some)
    }

    async fn load(&self, key: &str) -> Result<Project> {
        let project = self
            .store
            .load_project(key)
            .await
            .with_context(|| format!("Failed to load project '{key}'"))?;
        debug!(project = project.name(), files = project.files().len(), "Project loaded");
        Ok(project)
    }

    async fn credentials(&self) -> Result<Credentials> {
        match self
            .credentials
            .credentials()
            .await
            .context("Failed to read credentials")?
        {
            Some(credentials) => Ok(credentials),
            None => bail!(
                "No credentials found (provider: {}); run 'reposync auth login' or set GITHUB_TOKEN",
                self.credentials.name()
            ),
        }
    }
}

/// Keeps only the files named in `names`, preserving project order
fn restrict_to(project: &mut Project, names: &[String]) -> Result<()> {
    let known: HashSet<&str> = project.files().iter().map(|f| f.name()).collect();
    let missing: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| !known.contains(n))
        .collect();
    if !missing.is_empty() {
        bail!(
            "Project '{}' has no file named {}",
            project.name(),
            missing.join(", ")
        );
    }

    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    project.retain_files(|f| wanted.contains(f.name()));
    Ok(())
}
