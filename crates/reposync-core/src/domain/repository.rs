//! Remote repository types and platform request/response values

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{OwnerLogin, RemotePath, RepoName, RevisionToken};
use super::options::Committer;

/// A repository on the remote platform that a sync writes into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub owner: OwnerLogin,
    pub name: RepoName,
    pub html_url: String,
    /// True if this sync call created the repository
    pub created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

impl RemoteRepository {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A repository as returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub full_name: String,
    pub html_url: String,
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request to create a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRepository {
    pub owner: OwnerLogin,
    pub name: RepoName,
    pub description: Option<String>,
    pub private: bool,
    /// Create an initial commit so that the default branch exists
    pub auto_init: bool,
}

/// The current revision of a remote file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRevision {
    /// Token that must accompany an update of this path
    pub token: RevisionToken,
    /// Decoded remote content, when the platform returned it inline
    pub content: Option<Vec<u8>>,
}

/// Request to create or update one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFileContent {
    pub path: RemotePath,
    pub content: Vec<u8>,
    /// Current revision token; `None` creates the file
    pub revision: Option<RevisionToken>,
    pub message: String,
    pub committer: Option<Committer>,
    pub branch: Option<String>,
}

/// Result of a successful file write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFileOutcome {
    /// Revision token of the newly written content
    pub token: RevisionToken,
    /// Identifier of the commit that recorded the write, if reported
    pub commit_id: Option<String>,
}
