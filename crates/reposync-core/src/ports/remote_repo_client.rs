//! Remote repository platform port (driven/secondary port)
//!
//! This module defines the interface for interacting with a code-hosting
//! platform. The primary implementation targets GitHub via its REST API,
//! but the sync engine depends only on these traits.
//!
//! ## Design Notes
//!
//! - Uses the typed [`RemoteError`] rather than `anyhow::Result` because the
//!   engine must tell a name collision apart from an outage, and a transient
//!   failure apart from a permanent one.
//! - Uses `#[async_trait]` for async trait methods.
//! - Implementations do not retry; retry policy belongs to the engine.

use std::sync::Arc;

use crate::domain::{
    CreateRepository, Credentials, FileRevision, OwnerLogin, PutFileContent, PutFileOutcome,
    RemoteError, RemotePath, RemoteRepository, RepoName, RepositorySummary,
};

// ============================================================================
// IRemoteRepoClient
// ============================================================================

/// Port trait for remote repository operations
///
/// One client instance is bound to one set of credentials. It is shared
/// read-only between the upload workers of a sync call, so implementations
/// must be safe to call concurrently.
#[async_trait::async_trait]
pub trait IRemoteRepoClient: Send + Sync {
    /// Returns the login the credentials authenticate as
    async fn authenticated_owner(&self) -> Result<OwnerLogin, RemoteError>;

    /// Creates a new repository
    ///
    /// # Arguments
    /// * `request` - Owner, name, description, visibility and init flag
    ///
    /// # Returns
    /// The created repository with `created = true`.
    /// Fails with [`RemoteError::NameConflict`] if the name is already taken.
    async fn create_repository(
        &self,
        request: &CreateRepository,
    ) -> Result<RemoteRepository, RemoteError>;

    /// Looks up an existing repository
    ///
    /// # Returns
    /// The repository with `created = false`, or [`RemoteError::NotFound`]
    async fn get_repository(
        &self,
        owner: &OwnerLogin,
        name: &RepoName,
    ) -> Result<RemoteRepository, RemoteError>;

    /// Lists the caller's repositories, most recently updated first
    ///
    /// # Arguments
    /// * `limit` - Maximum number of repositories to return
    async fn list_repositories(&self, limit: u8) -> Result<Vec<RepositorySummary>, RemoteError>;

    /// Retrieves the current revision of a file
    ///
    /// # Arguments
    /// * `repository` - The repository to look in
    /// * `path` - Normalized path of the file
    /// * `branch` - Branch to read from; the default branch when `None`
    ///
    /// # Returns
    /// `Ok(None)` if the path does not exist. Any other failure is an error and
    /// must never be reported as absence.
    async fn get_file_revision(
        &self,
        repository: &RemoteRepository,
        path: &RemotePath,
        branch: Option<&str>,
    ) -> Result<Option<FileRevision>, RemoteError>;

    /// Creates or updates one file as a single commit
    ///
    /// # Arguments
    /// * `repository` - The repository to write into
    /// * `request` - Path, content, revision token (required for updates),
    ///   commit message, committer and branch
    ///
    /// # Returns
    /// The new revision token. A stale or missing token for an existing path
    /// fails with [`RemoteError::RevisionMismatch`].
    async fn put_file_content(
        &self,
        repository: &RemoteRepository,
        request: &PutFileContent,
    ) -> Result<PutFileOutcome, RemoteError>;
}

// ============================================================================
// IRemoteConnector
// ============================================================================

/// Builds a platform client bound to a set of credentials
///
/// The sync engine calls this once per sync so that credentials are supplied
/// per call rather than held globally.
#[async_trait::async_trait]
pub trait IRemoteConnector: Send + Sync {
    /// Create a client authorized with `credentials`
    async fn connect(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<dyn IRemoteRepoClient>, RemoteError>;
}
