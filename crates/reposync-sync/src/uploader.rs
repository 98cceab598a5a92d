//! Content upload
//!
//! One upload writes one file as one commit. Each attempt looks up the
//! current revision of the path first:
//!
//! - absent: the file is created without a revision token
//! - present with identical content: nothing is written (`unchanged`)
//! - present otherwise: the file is updated with the fetched token
//!
//! A failed lookup is an error, never "absent". A stale token is retried with
//! a fresh lookup.

use std::sync::Arc;

use reposync_core::domain::{
    Committer, FileRevision, FileSyncResult, ProjectFile, PutFileContent, RemotePath,
    RemoteRepository, RevisionToken, UploadAction, UploadError,
};
use reposync_core::ports::IRemoteRepoClient;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::retry::RetryPolicy;

/// Commit metadata applied to one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub message: String,
    pub committer: Option<Committer>,
    /// Target branch; the repository's default branch when `None`
    pub branch: Option<String>,
}

impl CommitMetadata {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            committer: None,
            branch: None,
        }
    }
}

/// What an attempt should write given the current remote revision
#[derive(Debug, PartialEq, Eq)]
enum WritePlan {
    Create,
    Update(RevisionToken),
    Skip,
}

impl WritePlan {
    fn for_revision(current: Option<FileRevision>, content: &[u8]) -> Self {
        match current {
            None => Self::Create,
            Some(rev) if rev.content.as_deref() == Some(content) => Self::Skip,
            Some(rev) => Self::Update(rev.token),
        }
    }
}

/// Pushes file content into a resolved repository
pub struct ContentUploader {
    client: Arc<dyn IRemoteRepoClient>,
    retry: RetryPolicy,
}

impl ContentUploader {
    pub fn new(client: Arc<dyn IRemoteRepoClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Uploads one file, retrying transient failures
    ///
    /// Never fails: the outcome, the action taken and the number of attempts
    /// are recorded in the returned [`FileSyncResult`].
    #[tracing::instrument(skip_all, fields(repository = %repository.full_name(), file = %file.name()))]
    pub async fn upload(
        &self,
        repository: &RemoteRepository,
        file: &ProjectFile,
        commit: &CommitMetadata,
        cancel: &CancellationToken,
    ) -> FileSyncResult {
        let path = match file.remote_path() {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "File name cannot be mapped to a remote path");
                let detail = UploadError::InvalidPath(e).to_string();
                return FileSyncResult::failed(file.name(), detail, 0);
            }
        };

        let path = &path;
        let retried = self
            .retry
            .run("upload", cancel, move |attempt| {
                debug!(attempt, %path, "Upload attempt");
                self.attempt(repository, path, file.content(), commit)
            })
            .await;

        match retried.result {
            Ok(action) => {
                info!(?action, attempts = retried.attempts, "Upload succeeded");
                FileSyncResult::succeeded(file.name(), action, retried.attempts)
            }
            Err(e) => {
                warn!(error = %e, attempts = retried.attempts, "Upload failed");
                FileSyncResult::failed(file.name(), e.to_string(), retried.attempts)
            }
        }
    }

    async fn attempt(
        &self,
        repository: &RemoteRepository,
        path: &RemotePath,
        content: &[u8],
        commit: &CommitMetadata,
    ) -> Result<UploadAction, UploadError> {
        let current = self
            .client
            .get_file_revision(repository, path, commit.branch.as_deref())
            .await?;

        let (revision, action) = match WritePlan::for_revision(current, content) {
            WritePlan::Skip => {
                debug!(%path, "Remote content is identical, skipping write");
                return Ok(UploadAction::Unchanged);
            }
            WritePlan::Create => (None, UploadAction::Created),
            WritePlan::Update(token) => (Some(token), UploadAction::Updated),
        };

        let request = PutFileContent {
            path: path.clone(),
            content: content.to_vec(),
            revision,
            message: commit.message.clone(),
            committer: commit.committer.clone(),
            branch: commit.branch.clone(),
        };
        let outcome = self.client.put_file_content(repository, &request).await?;
        debug!(%path, token = %outcome.token, "File written");
        Ok(action)
    }
}
