//! Credential providers for the GitHub adapter
//!
//! Provides:
//! - [`EnvCredentialProvider`] - token from an environment variable
//! - [`KeyringTokenStorage`] - token storage in the system keyring
//! - [`KeyringCredentialProvider`] - [`ICredentialProvider`] over the keyring
//! - [`ChainedCredentialProvider`] - first provider that has a token wins

use anyhow::{Context, Result};
use reposync_core::domain::{AccessToken, Credentials};
use reposync_core::ports::ICredentialProvider;
use tracing::{debug, info, warn};

/// Keyring service name for storing tokens
const KEYRING_SERVICE: &str = "reposync";

/// Keyring account used when none is given
pub const DEFAULT_KEYRING_ACCOUNT: &str = "github";

/// Environment variables consulted by default, in order
pub const DEFAULT_TOKEN_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

// ============================================================================
// EnvCredentialProvider
// ============================================================================

/// Reads a token from the first set, non-empty environment variable
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    vars: Vec<String>,
}

impl EnvCredentialProvider {
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }

    fn lookup(&self, get: impl Fn(&str) -> Option<String>) -> Option<(String, AccessToken)> {
        self.vars.iter().find_map(|var| {
            let value = get(var)?;
            AccessToken::new(value).ok().map(|t| (var.clone(), t))
        })
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_VARS.iter().copied())
    }
}

#[async_trait::async_trait]
impl ICredentialProvider for EnvCredentialProvider {
    async fn credentials(&self) -> Result<Option<Credentials>> {
        match self.lookup(|var| std::env::var(var).ok()) {
            Some((var, token)) => {
                debug!(var = %var, "Using token from environment");
                Ok(Some(Credentials::new(token)))
            }
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

// ============================================================================
// KeyringTokenStorage
// ============================================================================

/// Stores and retrieves access tokens in the system keyring
///
/// Uses the `keyring` crate to store tokens in the OS credential store
/// (e.g., GNOME Keyring, KDE Wallet, macOS Keychain).
pub struct KeyringTokenStorage;

impl KeyringTokenStorage {
    fn entry(account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, account).context("Failed to create keyring entry")
    }

    /// Stores a token for the given account
    pub fn store(account: &str, token: &AccessToken) -> Result<()> {
        Self::entry(account)?
            .set_password(token.expose_secret())
            .context("Failed to store token in keyring")?;
        debug!(account, "Stored token in keyring");
        Ok(())
    }

    /// Loads the token for the given account
    ///
    /// # Returns
    /// `None` if no token is stored
    pub fn load(account: &str) -> Result<Option<AccessToken>> {
        match Self::entry(account)?.get_password() {
            Ok(secret) => {
                let token = AccessToken::new(secret).context("Keyring holds an empty token")?;
                debug!(account, "Loaded token from keyring");
                Ok(Some(token))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account, "No token found in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    /// Removes the token for the given account
    ///
    /// # Returns
    /// `true` if a token was removed
    pub fn clear(account: &str) -> Result<bool> {
        match Self::entry(account)?.delete_credential() {
            Ok(()) => {
                info!(account, "Cleared token from keyring");
                Ok(true)
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account, "No token to clear");
                Ok(false)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

// ============================================================================
// KeyringCredentialProvider
// ============================================================================

/// [`ICredentialProvider`] reading from [`KeyringTokenStorage`]
#[derive(Debug, Clone)]
pub struct KeyringCredentialProvider {
    account: String,
}

impl KeyringCredentialProvider {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

impl Default for KeyringCredentialProvider {
    fn default() -> Self {
        Self::new(DEFAULT_KEYRING_ACCOUNT)
    }
}

#[async_trait::async_trait]
impl ICredentialProvider for KeyringCredentialProvider {
    async fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(KeyringTokenStorage::load(&self.account)?.map(Credentials::new))
    }

    fn name(&self) -> &'static str {
        "keyring"
    }
}

// ============================================================================
// ChainedCredentialProvider
// ============================================================================

/// Tries each provider in order and returns the first credentials found
///
/// A failing provider does not stop the chain. If no provider has
/// credentials and at least one failed, the last failure is returned.
pub struct ChainedCredentialProvider {
    providers: Vec<Box<dyn ICredentialProvider>>,
}

impl ChainedCredentialProvider {
    pub fn new(providers: Vec<Box<dyn ICredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Environment variables first, then the keyring
    pub fn standard(keyring_account: impl Into<String>) -> Self {
        Self::new(vec![
            Box::new(EnvCredentialProvider::default()),
            Box::new(KeyringCredentialProvider::new(keyring_account)),
        ])
    }
}

#[async_trait::async_trait]
impl ICredentialProvider for ChainedCredentialProvider {
    async fn credentials(&self) -> Result<Option<Credentials>> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.credentials().await {
                Ok(Some(credentials)) => {
                    debug!(provider = provider.name(), "Credentials found");
                    return Ok(Some(credentials));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Credential provider failed");
                    last_error = Some(e.context(format!("{} credential provider", provider.name())));
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "chained"
    }
}
