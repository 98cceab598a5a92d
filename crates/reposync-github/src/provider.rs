//! GitHubRepoClient - IRemoteRepoClient implementation for GitHub
//!
//! Wraps the [`GitHubClient`] and delegates to the repos and contents
//! modules to fulfil the [`IRemoteRepoClient`] port contract.
//!
//! ## Design Notes
//!
//! - The authenticated login is fetched at most once per client and cached
//!   in a `tokio::sync::OnceCell`; it decides whether a repository is created
//!   under the user or under an organization.
//! - [`GitHubConnector`] owns the rate limiter so that every client it hands
//!   out draws from one budget.

use std::sync::Arc;

use reposync_core::config::{RateLimitingConfig, RemoteConfig};
use reposync_core::domain::{
    CreateRepository, Credentials, FileRevision, OwnerLogin, PutFileContent, PutFileOutcome,
    RemoteError, RemotePath, RemoteRepository, RepoName, RepositorySummary,
};
use reposync_core::ports::{IRemoteConnector, IRemoteRepoClient};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::client::GitHubClient;
use crate::rate_limit::{AdaptiveRateLimiter, RateLimitConfig};

// ============================================================================
// GitHubRepoClient
// ============================================================================

/// GitHub implementation of [`IRemoteRepoClient`]
#[derive(Debug)]
pub struct GitHubRepoClient {
    client: GitHubClient,
    login: OnceCell<OwnerLogin>,
}

impl GitHubRepoClient {
    pub fn new(client: GitHubClient) -> Self {
        Self {
            client,
            login: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying [`GitHubClient`]
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    async fn login(&self) -> Result<&OwnerLogin, RemoteError> {
        self.login
            .get_or_try_init(|| self.client.get_authenticated_user())
            .await
    }
}

#[async_trait::async_trait]
impl IRemoteRepoClient for GitHubRepoClient {
    async fn authenticated_owner(&self) -> Result<OwnerLogin, RemoteError> {
        self.login().await.cloned()
    }

    async fn create_repository(
        &self,
        request: &CreateRepository,
    ) -> Result<RemoteRepository, RemoteError> {
        let for_user = *self.login().await? == request.owner;
        debug!(owner = %request.owner, for_user, "Resolved repository creation endpoint");
        self.client.create_repository(request, for_user).await
    }

    async fn get_repository(
        &self,
        owner: &OwnerLogin,
        name: &RepoName,
    ) -> Result<RemoteRepository, RemoteError> {
        self.client.get_repository(owner, name).await
    }

    async fn list_repositories(&self, limit: u8) -> Result<Vec<RepositorySummary>, RemoteError> {
        self.client.list_repositories(limit).await
    }

    async fn get_file_revision(
        &self,
        repository: &RemoteRepository,
        path: &RemotePath,
        branch: Option<&str>,
    ) -> Result<Option<FileRevision>, RemoteError> {
        self.client.get_file_revision(repository, path, branch).await
    }

    async fn put_file_content(
        &self,
        repository: &RemoteRepository,
        request: &PutFileContent,
    ) -> Result<PutFileOutcome, RemoteError> {
        self.client.put_file_content(repository, request).await
    }
}

// ============================================================================
// GitHubConnector
// ============================================================================

/// Builds [`GitHubRepoClient`]s for per-call credentials
#[derive(Debug, Clone)]
pub struct GitHubConnector {
    remote: RemoteConfig,
    rate_limiter: Arc<AdaptiveRateLimiter>,
}

impl GitHubConnector {
    pub fn new(remote: RemoteConfig, rate_limiter: Arc<AdaptiveRateLimiter>) -> Self {
        Self {
            remote,
            rate_limiter,
        }
    }

    /// Creates a connector from the `remote` and `rate_limiting` config sections
    pub fn from_config(remote: &RemoteConfig, rate_limiting: &RateLimitingConfig) -> Self {
        let limiter = AdaptiveRateLimiter::new(RateLimitConfig::from(rate_limiting));
        Self::new(remote.clone(), Arc::new(limiter))
    }

    /// Builds a concrete client (also usable outside the port)
    pub fn client_for(&self, credentials: &Credentials) -> Result<GitHubRepoClient, RemoteError> {
        let client = GitHubClient::from_config(credentials.token().clone(), &self.remote)
            .map_err(|e| RemoteError::other(None, e.to_string()))?
            .with_rate_limiter(Arc::clone(&self.rate_limiter));
        Ok(GitHubRepoClient::new(client))
    }
}

#[async_trait::async_trait]
impl IRemoteConnector for GitHubConnector {
    async fn connect(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<dyn IRemoteRepoClient>, RemoteError> {
        Ok(Arc::new(self.client_for(credentials)?))
    }
}
