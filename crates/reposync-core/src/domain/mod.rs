//! Domain entities
//!
//! This module contains the core domain types for reposync:
//! - Newtypes for validated identifiers, names, paths and tokens
//! - Projects and their files
//! - Per-call sync options and credentials
//! - Remote repository values exchanged with the platform
//! - Sync reports
//! - Domain-specific error types

pub mod credentials;
pub mod errors;
pub mod newtypes;
pub mod options;
pub mod project;
pub mod report;
pub mod repository;

// Re-export commonly used types
pub use credentials::Credentials;
pub use errors::{DomainError, RemoteError, ResolutionError, UploadError};
pub use newtypes::*;
pub use options::{
    Committer, ConflictPolicy, SyncOptions, DEFAULT_COMMIT_MESSAGE, DEFAULT_CONCURRENCY,
};
pub use project::{Project, ProjectFile};
pub use report::{FileOutcome, FileSyncResult, SyncOutcome, SyncReport, UploadAction};
pub use repository::{
    CreateRepository, FileRevision, PutFileContent, PutFileOutcome, RemoteRepository,
    RepositorySummary,
};
