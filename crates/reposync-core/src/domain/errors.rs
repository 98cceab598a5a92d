//! Domain error types
//!
//! This module defines the error taxonomy shared by the sync engine and
//! its adapters:
//!
//! - [`DomainError`] - validation failures when constructing domain values
//! - [`RemoteError`] - failures reported by a remote platform operation
//! - [`ResolutionError`] - fatal failures while resolving the target repository
//! - [`UploadError`] - failures scoped to a single file upload

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing or validating domain values
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainError {
    /// Invalid remote file path
    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// Invalid repository name
    #[error("Invalid repository name: {0}")]
    InvalidRepoName(String),

    /// Invalid owner login
    #[error("Invalid owner login: {0}")]
    InvalidOwner(String),

    /// Two files of one project map to the same remote path
    #[error("Duplicate file name after normalization: {0}")]
    DuplicateFileName(String),

    /// Invalid revision token
    #[error("Invalid revision token: {0}")]
    InvalidRevisionToken(String),

    /// Invalid value for a textual enum (e.g. a conflict policy)
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// The field being parsed
        field: String,
        /// The rejected value
        value: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors reported by a remote repository platform
///
/// Every [`IRemoteRepoClient`](crate::ports::IRemoteRepoClient) operation
/// classifies its failures into one of these variants so that callers can
/// tell a name collision apart from an outage, and a throttle apart from a
/// rejected credential.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteError {
    /// The addressed resource does not exist (or is invisible to the caller)
    #[error("Not found: {message}")]
    NotFound {
        /// Platform-provided detail
        message: String,
    },

    /// A repository with the requested name already exists
    #[error("Name conflict: {message}")]
    NameConflict {
        /// Platform-provided detail
        message: String,
    },

    /// Primary or secondary rate limit hit
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited {
        /// Delay suggested by the platform, if any
        retry_after: Option<Duration>,
    },

    /// Credentials are missing, invalid, revoked or lack permission
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Platform-provided detail
        message: String,
    },

    /// Connection reset, timeout, DNS failure or 5xx response
    #[error("Transient network error: {message}")]
    TransientNetworkError {
        /// Transport or platform detail
        message: String,
    },

    /// A write was rejected because the supplied revision token is stale or missing
    #[error("Revision mismatch: {message}")]
    RevisionMismatch {
        /// Platform-provided detail
        message: String,
    },

    /// Any other failure (validation rejects, unexpected payloads, other 4xx)
    #[error("Remote error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Other {
        /// HTTP status, when the failure came from a response
        status: Option<u16>,
        /// Platform-provided detail
        message: String,
    },
}

impl RemoteError {
    /// Shorthand for [`RemoteError::NotFound`]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Shorthand for [`RemoteError::NameConflict`]
    pub fn name_conflict(message: impl Into<String>) -> Self {
        Self::NameConflict {
            message: message.into(),
        }
    }

    /// Shorthand for [`RemoteError::Unauthorized`]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Shorthand for [`RemoteError::TransientNetworkError`]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientNetworkError {
            message: message.into(),
        }
    }

    /// Shorthand for [`RemoteError::RevisionMismatch`]
    pub fn revision_mismatch(message: impl Into<String>) -> Self {
        Self::RevisionMismatch {
            message: message.into(),
        }
    }

    /// Shorthand for [`RemoteError::Other`]
    pub fn other(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Other {
            status,
            message: message.into(),
        }
    }

    /// Returns true if retrying the same operation later may succeed
    ///
    /// Rate limits, network faults and stale revision tokens are transient.
    /// Authorization failures, missing resources, name conflicts and other
    /// rejections are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::TransientNetworkError { .. }
                | Self::RevisionMismatch { .. }
        )
    }

    /// The platform's suggested retry delay, if this is a rate-limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Fatal errors while resolving the target repository
///
/// Any of these aborts the whole sync before a single file is uploaded.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionError {
    /// The sync options were rejected before contacting the platform
    #[error("Invalid sync options: {reason}")]
    InvalidOptions {
        /// Why the options were rejected
        reason: String,
    },

    /// A repository of the requested name exists and may not be reused
    #[error("Repository {owner}/{name} already exists")]
    RepositoryNameConflict {
        /// Requested owner
        owner: String,
        /// Requested repository name
        name: String,
    },

    /// The credentials were rejected while creating or looking up the repository
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Platform-provided detail
        message: String,
    },

    /// Any other platform failure, surfaced verbatim
    #[error("Remote unavailable: {source}")]
    RemoteUnavailable {
        /// The underlying remote failure
        source: RemoteError,
    },
}

/// Errors scoped to a single file upload
///
/// These never escalate beyond the file's
/// [`FileSyncResult`](crate::domain::FileSyncResult).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Rate limit, network fault or 5xx; retried in place
    #[error("{0}")]
    Transient(RemoteError),

    /// The revision token went stale; retried with a fresh token fetch
    #[error("{0}")]
    RevisionMismatch(RemoteError),

    /// The credentials were rejected; not retried
    #[error("{0}")]
    Unauthorized(RemoteError),

    /// Any other remote rejection; not retried
    #[error("{0}")]
    Remote(RemoteError),

    /// The file name cannot be mapped to a remote path
    #[error("{0}")]
    InvalidPath(DomainError),

    /// The sync was cancelled before the upload could complete
    #[error("cancelled")]
    Cancelled,
}

impl UploadError {
    /// Returns true if the uploader should try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RevisionMismatch(_))
    }

    /// The platform's suggested retry delay, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transient(err) => err.retry_after(),
            _ => None,
        }
    }
}

impl From<RemoteError> for UploadError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::RateLimited { .. } | RemoteError::TransientNetworkError { .. } => {
                Self::Transient(err)
            }
            RemoteError::RevisionMismatch { .. } => Self::RevisionMismatch(err),
            RemoteError::Unauthorized { .. } => Self::Unauthorized(err),
            other => Self::Remote(other),
        }
    }
}
