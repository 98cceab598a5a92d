//! Credential provider port (driven/secondary port)

use crate::domain::Credentials;

/// Port trait for obtaining platform credentials
#[async_trait::async_trait]
pub trait ICredentialProvider: Send + Sync {
    /// Returns the credentials for the current user
    ///
    /// # Returns
    /// `Ok(None)` if this provider has no credentials configured
    async fn credentials(&self) -> anyhow::Result<Option<Credentials>>;

    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;
}
