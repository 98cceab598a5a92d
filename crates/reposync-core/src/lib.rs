//! reposync Core - Domain model, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Project`, `ProjectFile`, `RemoteRepository`, `SyncReport`
//! - **Error taxonomy** - `RemoteError`, `ResolutionError`, `UploadError`
//! - **Port definitions** - `IRemoteRepoClient`, `IRemoteConnector`, `IProjectStore`,
//!   `ICredentialProvider`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module is pure data and validation with no I/O. Ports define
//! the trait interfaces that adapter crates (`reposync-github`, the CLI's
//! directory store) implement, and that the sync engine (`reposync-sync`)
//! depends on.

pub mod config;
pub mod domain;
pub mod ports;
