//! reposync GitHub - GitHub REST API adapter
//!
//! Provides the async GitHub implementation of the reposync ports:
//! - Repository creation, lookup and listing
//! - File revision lookup and content upload via the contents API
//! - Proactive, adaptive client-side rate limiting
//! - Credential providers (environment variable, system keyring)
//!
//! ## Modules
//!
//! - [`auth`] - Credential providers and keyring token storage
//! - [`client`] - Authenticated HTTP client and response classification
//! - [`contents`] - `/repos/{owner}/{repo}/contents/{path}` endpoints
//! - [`provider`] - `IRemoteRepoClient` / `IRemoteConnector` implementations
//! - [`rate_limit`] - Token-bucket rate limiter with throttle feedback
//! - [`repos`] - Repository and user endpoints

pub mod auth;
pub mod client;
pub mod contents;
pub mod provider;
pub mod rate_limit;
pub mod repos;

use thiserror::Error;

pub use auth::{
    ChainedCredentialProvider, EnvCredentialProvider, KeyringCredentialProvider,
    KeyringTokenStorage,
};
pub use client::GitHubClient;
pub use provider::{GitHubConnector, GitHubRepoClient};
pub use rate_limit::{AdaptiveRateLimiter, EndpointCategory, RateLimitConfig};

/// Errors raised while setting up a GitHub client
///
/// Failures of individual API calls are reported as
/// [`RemoteError`](reposync_core::domain::RemoteError) instead.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The configured API base URL cannot be parsed or cannot have a path
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// A header value could not be encoded
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// The underlying HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
