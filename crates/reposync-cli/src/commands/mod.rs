//! CLI subcommands

pub mod auth;
pub mod completions;
pub mod config;
pub mod push;
pub mod repos;

use std::sync::Arc;

use anyhow::{Context, Result};
use reposync_core::{config::Config, domain::Credentials, ports::ICredentialProvider};
use reposync_github::{auth::DEFAULT_KEYRING_ACCOUNT, ChainedCredentialProvider, GitHubConnector};

/// Environment variables first, then the system keyring
pub fn credential_provider() -> Arc<dyn ICredentialProvider> {
    Arc::new(ChainedCredentialProvider::standard(DEFAULT_KEYRING_ACCOUNT))
}

pub fn connector(config: &Config) -> GitHubConnector {
    GitHubConnector::from_config(&config.remote, &config.rate_limiting)
}

/// Credentials from the standard providers, or an error telling the user how to add some
pub async fn require_credentials() -> Result<Credentials> {
    let provider = credential_provider();
    provider
        .credentials()
        .await
        .context("Failed to look up credentials")?
        .context("No credentials found. Run 'reposync auth login' or set GITHUB_TOKEN")
}
