//! Project store port (driven/secondary port)
//!
//! Supplies the projects the sync engine materializes remotely. Uses
//! `anyhow::Result` because store failures are adapter-specific and only
//! ever surface to the caller.

use crate::domain::Project;

/// Port trait for loading projects
#[async_trait::async_trait]
pub trait IProjectStore: Send + Sync {
    /// Loads a project by its store-specific key
    ///
    /// # Arguments
    /// * `key` - Identifier understood by the store (e.g. a directory path)
    async fn load_project(&self, key: &str) -> anyhow::Result<Project>;
}
