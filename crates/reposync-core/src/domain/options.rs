//! Per-call sync options

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{RemotePath, RepoName};

/// Default number of parallel uploads
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default commit message template
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update {path}";

/// What to do when the desired repository name is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Abort the sync with a name-conflict error
    #[default]
    Fail,
    /// Reuse the existing repository if the caller owns it
    ReuseExisting,
}

impl Display for ConflictPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => f.write_str("fail"),
            Self::ReuseExisting => f.write_str("reuse-existing"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "reuse-existing" | "reuse_existing" | "reuse" => Ok(Self::ReuseExisting),
            other => Err(DomainError::InvalidValue {
                field: "on_conflict".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Identity recorded as the committer of uploaded files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

impl Committer {
    /// Create a new committer identity
    ///
    /// # Errors
    /// Returns error if the name is blank or the email has no `@`
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Committer name cannot be empty".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(DomainError::ValidationFailed(format!(
                "Committer email is invalid: {email}"
            )));
        }
        Ok(Self { name, email })
    }
}

/// Options controlling one sync call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Repository name override; defaults to the project name
    pub repo_name: Option<String>,
    /// Description override; defaults to the project description
    pub description: Option<String>,
    pub is_private: bool,
    /// Maximum number of parallel uploads
    pub concurrency: usize,
    pub on_conflict: ConflictPolicy,
    /// Commit message template; `{path}` and `{project}` are substituted
    pub commit_message: Option<String>,
    pub committer: Option<Committer>,
    /// Target branch; the repository's default branch when absent
    pub branch: Option<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            repo_name: None,
            description: None,
            is_private: false,
            concurrency: DEFAULT_CONCURRENCY,
            on_conflict: ConflictPolicy::default(),
            commit_message: None,
            committer: None,
            branch: None,
        }
    }
}

impl SyncOptions {
    /// Check the options against the project they will be applied to
    ///
    /// Returns the effective repository name: the override when present,
    /// otherwise the project name.
    ///
    /// # Errors
    /// Returns error if concurrency is zero, the effective repository name is
    /// blank or invalid, or the branch name is blank
    pub fn validate(&self, project_name: &str) -> Result<RepoName, DomainError> {
        if self.concurrency == 0 {
            return Err(DomainError::ValidationFailed(
                "concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(branch) = &self.branch {
            if branch.trim().is_empty() {
                return Err(DomainError::ValidationFailed(
                    "branch cannot be empty".to_string(),
                ));
            }
        }

        let name = self
            .repo_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(project_name);
        RepoName::new(name.to_string())
    }

    /// Render the commit message for one file
    pub fn commit_message_for(&self, path: &RemotePath, project_name: &str) -> String {
        let template = self
            .commit_message
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_COMMIT_MESSAGE);
        template
            .replace("{path}", path.as_str())
            .replace("{project}", project_name)
    }
}
