//! Sync report types
//!
//! A [`SyncReport`] is built fresh for every sync call and never mutated
//! after it is returned. It serializes to JSON for callers that render it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ResolutionError;
use super::newtypes::SyncId;
use super::repository::RemoteRepository;

/// Terminal state of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Succeeded,
    Failed,
}

/// What a successful upload did to the remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadAction {
    /// The path did not exist remotely
    Created,
    /// The path existed with different content
    Updated,
    /// The path already held identical content; nothing was written
    Unchanged,
}

/// Result of synchronizing a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSyncResult {
    pub file_name: String,
    pub outcome: FileOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<UploadAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Number of upload attempts made (0 if the file was never attempted)
    pub attempts: u32,
}

impl FileSyncResult {
    pub fn succeeded(file_name: impl Into<String>, action: UploadAction, attempts: u32) -> Self {
        Self {
            file_name: file_name.into(),
            outcome: FileOutcome::Succeeded,
            action: Some(action),
            error_detail: None,
            attempts,
        }
    }

    pub fn failed(file_name: impl Into<String>, detail: impl Into<String>, attempts: u32) -> Self {
        Self {
            file_name: file_name.into(),
            outcome: FileOutcome::Failed,
            action: None,
            error_detail: Some(detail.into()),
            attempts,
        }
    }

    /// A file that was never attempted because the sync was cancelled
    pub fn cancelled(file_name: impl Into<String>) -> Self {
        Self::failed(file_name, "cancelled", 0)
    }

    pub fn is_success(&self) -> bool {
        self.outcome == FileOutcome::Succeeded
    }
}

/// Overall outcome of a sync call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every file succeeded (vacuously true for an empty project)
    Complete,
    /// The repository was resolved but at least one file failed
    Partial,
    /// The repository could not be resolved; no upload was attempted
    Aborted,
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => f.write_str("complete"),
            Self::Partial => f.write_str("partial"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// The result of one sync call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub sync_id: SyncId,
    pub repository: Option<RemoteRepository>,
    /// One entry per project file, in project order
    pub file_results: Vec<FileSyncResult>,
    pub overall_outcome: SyncOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_error: Option<ResolutionError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    /// Build the report of a sync that failed before any upload
    pub fn aborted(sync_id: SyncId, started_at: DateTime<Utc>, error: ResolutionError) -> Self {
        Self {
            sync_id,
            repository: None,
            file_results: Vec::new(),
            overall_outcome: SyncOutcome::Aborted,
            resolution_error: Some(error),
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Build the report of a sync whose repository was resolved
    ///
    /// The outcome is `Complete` iff every result succeeded.
    pub fn from_results(
        sync_id: SyncId,
        started_at: DateTime<Utc>,
        repository: RemoteRepository,
        file_results: Vec<FileSyncResult>,
    ) -> Self {
        let overall_outcome = if file_results.iter().all(FileSyncResult::is_success) {
            SyncOutcome::Complete
        } else {
            SyncOutcome::Partial
        };

        Self {
            sync_id,
            repository: Some(repository),
            file_results,
            overall_outcome,
            resolution_error: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.file_results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.file_results.len() - self.succeeded_count()
    }

    /// Names of the files that failed, in project order
    pub fn failed_file_names(&self) -> Vec<String> {
        self.file_results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.file_name.clone())
            .collect()
    }

    /// Number of files with the given action
    pub fn count_action(&self, action: UploadAction) -> usize {
        self.file_results
            .iter()
            .filter(|r| r.action == Some(action))
            .count()
    }
}
