//! Auth commands - Login, Logout, and Status for the GitHub access token
//!
//! Provides the `reposync auth` CLI subcommands which:
//! 1. `login`  - Verifies a personal access token with `GET /user` and stores
//!    it in the system keyring.
//! 2. `logout` - Removes the token from the keyring.
//! 3. `status` - Shows where credentials come from and who they belong to.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use reposync_core::{
    config::Config,
    domain::{AccessToken, OwnerLogin, RemoteError},
    ports::ICredentialProvider,
};
use reposync_github::{
    auth::DEFAULT_KEYRING_ACCOUNT, EnvCredentialProvider, GitHubClient, KeyringTokenStorage,
};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::output::{get_formatter, OutputFormatter};
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store a personal access token in the system keyring
    Login {
        /// Token to store (prefer --with-token to keep it out of shell history)
        #[arg(long, conflicts_with = "with_token")]
        token: Option<String>,
        /// Read the token from standard input
        #[arg(long)]
        with_token: bool,
    },
    /// Remove the stored token
    Logout,
    /// Check authentication status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let fmt = get_formatter(ctx.format);
        match self {
            AuthCommand::Login { token, with_token } => {
                let raw = match (token, with_token) {
                    (Some(token), _) => token.clone(),
                    (None, true) => read_token_from_stdin().await?,
                    (None, false) => bail!("Provide a token with --token or --with-token"),
                };
                self.execute_login(&raw, &ctx.config, &*fmt).await
            }
            AuthCommand::Logout => self.execute_logout(&*fmt).await,
            AuthCommand::Status => self.execute_status(ctx, &*fmt).await,
        }
    }

    /// Verify the token against the API, then store it
    async fn execute_login(
        &self,
        raw: &str,
        config: &Config,
        fmt: &dyn OutputFormatter,
    ) -> Result<()> {
        let token = AccessToken::new(raw).context("The token is empty")?;

        fmt.info("Verifying token...");
        let login = whoami(&token, config)
            .await
            .context("GitHub rejected the token")?;
        info!(login = %login, "Token verified");

        KeyringTokenStorage::store(DEFAULT_KEYRING_ACCOUNT, &token)
            .context("Failed to store token in keyring")?;

        fmt.success(&format!("Authenticated as {login}"));
        fmt.info("Token stored in the system keyring");
        Ok(())
    }

    async fn execute_logout(&self, fmt: &dyn OutputFormatter) -> Result<()> {
        if KeyringTokenStorage::clear(DEFAULT_KEYRING_ACCOUNT)? {
            fmt.success("Logged out successfully");
            fmt.info("Token removed from keyring");
        } else {
            fmt.info("No stored token. Nothing to log out.");
        }
        if matches!(EnvCredentialProvider::default().credentials().await, Ok(Some(_))) {
            fmt.warn("GITHUB_TOKEN or GH_TOKEN is still set in the environment");
        }
        Ok(())
    }

    async fn execute_status(&self, ctx: &AppContext, fmt: &dyn OutputFormatter) -> Result<()> {
        let (source, token) = match EnvCredentialProvider::default().credentials().await? {
            Some(credentials) => ("environment", Some(credentials.token().clone())),
            None => (
                "keyring",
                KeyringTokenStorage::load(DEFAULT_KEYRING_ACCOUNT)
                    .context("Failed to read keyring")?,
            ),
        };

        let Some(token) = token else {
            if ctx.format.is_json() {
                fmt.print_json(&serde_json::json!({ "authenticated": false }));
            } else {
                fmt.info("Authentication status: Not configured");
                fmt.info("Run 'reposync auth login --with-token' or set GITHUB_TOKEN");
            }
            return Ok(());
        };

        let verified = whoami(&token, &ctx.config).await;

        if ctx.format.is_json() {
            let json = serde_json::json!({
                "authenticated": verified.is_ok(),
                "source": source,
                "login": verified.as_ref().ok().map(OwnerLogin::as_str),
                "error": verified.as_ref().err().map(ToString::to_string),
                "api_base_url": ctx.config.remote.api_base_url,
            });
            fmt.print_json(&json);
            return Ok(());
        }

        match verified {
            Ok(login) => {
                fmt.success(&format!("Authenticated as {login}"));
                fmt.info(&format!("Token source: {source}"));
                fmt.info(&format!("API:          {}", ctx.config.remote.api_base_url));
            }
            Err(e) => {
                fmt.error(&format!("Token from {source} is not usable: {e}"));
            }
        }
        Ok(())
    }
}

async fn whoami(token: &AccessToken, config: &Config) -> Result<OwnerLogin, RemoteError> {
    let client = GitHubClient::from_config(token.clone(), &config.remote)
        .map_err(|e| RemoteError::other(None, e.to_string()))?;
    client.get_authenticated_user().await
}

async fn read_token_from_stdin() -> Result<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read token from stdin")?;
    Ok(input)
}
