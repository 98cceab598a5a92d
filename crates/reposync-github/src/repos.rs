//! Repository and user endpoints
//!
//! - `GET /user`
//! - `POST /user/repos` and `POST /orgs/{org}/repos`
//! - `GET /repos/{owner}/{repo}`
//! - `GET /user/repos?sort=updated&direction=desc`

use chrono::{DateTime, Utc};
use reposync_core::domain::{
    CreateRepository, OwnerLogin, RemoteError, RemoteRepository, RepoName, RepositorySummary,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{ApiCall, GitHubClient};
use crate::rate_limit::EndpointCategory;

/// Largest page GitHub serves for repository listings
pub const MAX_PAGE_SIZE: u8 = 100;

// ============================================================================
// API payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    full_name: String,
    html_url: String,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    owner: OwnerResponse,
}

impl RepoResponse {
    fn into_remote(self, created: bool) -> Result<RemoteRepository, RemoteError> {
        let owner = OwnerLogin::new(self.owner.login)
            .map_err(|e| RemoteError::other(None, format!("unexpected owner in response: {e}")))?;
        let name = RepoName::new(self.name)
            .map_err(|e| RemoteError::other(None, format!("unexpected name in response: {e}")))?;
        Ok(RemoteRepository {
            owner,
            name,
            html_url: self.html_url,
            created,
            default_branch: self.default_branch,
        })
    }

    fn into_summary(self) -> RepositorySummary {
        RepositorySummary {
            full_name: self.full_name,
            html_url: self.html_url,
            private: self.private,
            description: self.description,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    private: bool,
    auto_init: bool,
}

// ============================================================================
// Endpoints
// ============================================================================

impl GitHubClient {
    /// Returns the login of the authenticated user (`GET /user`)
    pub async fn get_authenticated_user(&self) -> Result<OwnerLogin, RemoteError> {
        let url = self.endpoint(["user"])?;
        let user: UserResponse = self
            .send_json(self.request(Method::GET, url), EndpointCategory::Core, ApiCall::Read)
            .await?;
        OwnerLogin::new(user.login)
            .map_err(|e| RemoteError::other(None, format!("unexpected login in response: {e}")))
    }

    /// Creates a repository
    ///
    /// # Arguments
    /// * `request` - Repository parameters
    /// * `for_authenticated_user` - Create under the user (`POST /user/repos`)
    ///   rather than under the organization named by `request.owner`
    pub async fn create_repository(
        &self,
        request: &CreateRepository,
        for_authenticated_user: bool,
    ) -> Result<RemoteRepository, RemoteError> {
        let url = if for_authenticated_user {
            self.endpoint(["user", "repos"])?
        } else {
            self.endpoint(["orgs", request.owner.as_str(), "repos"])?
        };

        let body = CreateRepoBody {
            name: request.name.as_str(),
            description: request.description.as_deref(),
            private: request.private,
            auto_init: request.auto_init,
        };

        debug!(owner = %request.owner, name = %request.name, "Creating repository");
        let repo: RepoResponse = self
            .send_json(
                self.request(Method::POST, url).json(&body),
                EndpointCategory::ContentWrite,
                ApiCall::CreateRepository,
            )
            .await?;
        info!(full_name = %repo.full_name, "Repository created");
        repo.into_remote(true)
    }

    /// Looks up a repository (`GET /repos/{owner}/{repo}`)
    pub async fn get_repository(
        &self,
        owner: &OwnerLogin,
        name: &RepoName,
    ) -> Result<RemoteRepository, RemoteError> {
        let url = self.endpoint(["repos", owner.as_str(), name.as_str()])?;
        let repo: RepoResponse = self
            .send_json(self.request(Method::GET, url), EndpointCategory::Core, ApiCall::Read)
            .await?;
        repo.into_remote(false)
    }

    /// Lists the user's repositories, most recently updated first
    ///
    /// `limit` is clamped to 1..=[`MAX_PAGE_SIZE`]; only the first page is read.
    pub async fn list_repositories(&self, limit: u8) -> Result<Vec<RepositorySummary>, RemoteError> {
        let mut url = self.endpoint(["user", "repos"])?;
        url.query_pairs_mut()
            .append_pair("sort", "updated")
            .append_pair("direction", "desc")
            .append_pair("per_page", &limit.clamp(1, MAX_PAGE_SIZE).to_string());

        let repos: Vec<RepoResponse> = self
            .send_json(self.request(Method::GET, url), EndpointCategory::Core, ApiCall::Read)
            .await?;
        Ok(repos.into_iter().map(RepoResponse::into_summary).collect())
    }
}
