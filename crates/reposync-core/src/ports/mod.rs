//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. The sync engine depends on these interfaces;
//! their implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteRepoClient`] - Repository and file operations on the remote platform
//! - [`IRemoteConnector`] - Builds an `IRemoteRepoClient` from credentials
//! - [`IProjectStore`] - Source of projects to synchronize
//! - [`ICredentialProvider`] - Source of platform credentials

pub mod credentials;
pub mod project_store;
pub mod remote_repo_client;

pub use credentials::ICredentialProvider;
pub use project_store::IProjectStore;
pub use remote_repo_client::{IRemoteConnector, IRemoteRepoClient};
