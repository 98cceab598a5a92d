//! reposync Sync - Repository synchronization engine
//!
//! Provides:
//! - Repository resolution (create, or reuse on name collision)
//! - Per-file content upload with bounded retry
//! - A bounded worker pool producing one ordered [`SyncReport`]
//!
//! ## Modules
//!
//! - [`retry`] - Exponential backoff for transient platform failures
//! - [`resolver`] - Decides between creating and reusing a remote repository
//! - [`uploader`] - Pushes one file's content as a commit
//! - [`orchestrator`] - Drives a whole sync call
//! - [`service`] - Composes a project store, credentials and the orchestrator
//!
//! [`SyncReport`]: reposync_core::domain::SyncReport

pub mod orchestrator;
pub mod resolver;
pub mod retry;
pub mod service;
pub mod uploader;

pub use orchestrator::SyncOrchestrator;
pub use resolver::RepositoryResolver;
pub use retry::RetryPolicy;
pub use service::ProjectSyncService;
pub use uploader::{CommitMetadata, ContentUploader};
