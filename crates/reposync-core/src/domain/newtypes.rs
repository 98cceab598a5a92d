//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for identifiers and values
//! exchanged with a remote repository platform. Each newtype ensures data
//! validity at construction time.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// UUID-based ID types
// ============================================================================

/// Identifier for Project entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Create a new random ProjectId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a ProjectId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::ValidationFailed(format!("Invalid ProjectId: {e}")))
    }
}

/// Identifier for a single sync run, carried by its report and log spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncId(Uuid);

impl SyncId {
    /// Create a new random SyncId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SyncId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SyncId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// OwnerLogin
// ============================================================================

/// Login of a user or organization owning repositories
///
/// Logins are 1-39 characters of ASCII alphanumerics and hyphens, and may not
/// start or end with a hyphen. The platform treats them case-insensitively,
/// so equality does too; the original spelling is preserved for display.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerLogin(String);

impl OwnerLogin {
    const MAX_LEN: usize = 39;

    /// Create a new OwnerLogin
    ///
    /// # Errors
    /// Returns error if the login is empty, too long or contains invalid characters
    pub fn new(login: String) -> Result<Self, DomainError> {
        if login.is_empty() {
            return Err(DomainError::InvalidOwner(
                "Owner login cannot be empty".to_string(),
            ));
        }

        if login.len() > Self::MAX_LEN {
            return Err(DomainError::InvalidOwner(format!(
                "Owner login exceeds {} characters: {login}",
                Self::MAX_LEN
            )));
        }

        if !login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomainError::InvalidOwner(format!(
                "Owner login contains invalid characters: {login}"
            )));
        }

        if login.starts_with('-') || login.ends_with('-') {
            return Err(DomainError::InvalidOwner(format!(
                "Owner login cannot start or end with '-': {login}"
            )));
        }

        Ok(Self(login))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for OwnerLogin {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for OwnerLogin {}

impl std::hash::Hash for OwnerLogin {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl Debug for OwnerLogin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnerLogin").field(&self.0).finish()
    }
}

impl Display for OwnerLogin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerLogin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for OwnerLogin {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<OwnerLogin> for String {
    fn from(login: OwnerLogin) -> Self {
        login.0
    }
}

// ============================================================================
// RepoName
// ============================================================================

/// Name of a remote repository
///
/// Names are 1-100 characters of ASCII alphanumerics, `.`, `-` and `_`, and
/// may not be `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName(String);

impl RepoName {
    const MAX_LEN: usize = 100;

    /// Create a new RepoName
    ///
    /// # Errors
    /// Returns error if the name is empty, too long, reserved or contains invalid characters
    pub fn new(name: String) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidRepoName(
                "Repository name cannot be empty".to_string(),
            ));
        }

        if name.len() > Self::MAX_LEN {
            return Err(DomainError::InvalidRepoName(format!(
                "Repository name exceeds {} characters: {name}",
                Self::MAX_LEN
            )));
        }

        if name == "." || name == ".." {
            return Err(DomainError::InvalidRepoName(format!(
                "Repository name is reserved: {name}"
            )));
        }

        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(DomainError::InvalidRepoName(format!(
                "Repository name contains invalid character {c:?}: {name}"
            )));
        }

        Ok(Self(name))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RepoName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RepoName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RepoName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoName> for String {
    fn from(name: RepoName) -> Self {
        name.0
    }
}

// ============================================================================
// RemotePath
// ============================================================================

/// Normalized path of a file inside a remote repository
///
/// Paths are relative to the repository root and use `/` as the separator.
/// See [`RemotePath::normalize`] for the accepted input forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Normalize a local file name into a remote path
    ///
    /// Backslashes become `/`, leading `/` and `./` are stripped, and empty or
    /// `.` segments are dropped.
    ///
    /// # Errors
    /// Returns error if the path contains a `..` segment or a control
    /// character, or if nothing remains after normalization
    pub fn normalize(name: &str) -> Result<Self, DomainError> {
        if let Some(c) = name.chars().find(|c| c.is_control()) {
            return Err(DomainError::InvalidRemotePath(format!(
                "Path contains control character {c:?}: {name}"
            )));
        }

        let unified = name.replace('\\', "/");
        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(DomainError::InvalidRemotePath(format!(
                        "Path contains invalid traversal: {name}"
                    )));
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(DomainError::InvalidRemotePath(format!(
                "Path is empty after normalization: {name:?}"
            )));
        }

        Ok(Self(segments.join("/")))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the file name component
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Iterate over the path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemotePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for RemotePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::normalize(&s)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.0
    }
}

// ============================================================================
// Platform-specific tokens
// ============================================================================

/// Opaque token identifying the current revision of a remote file
///
/// For GitHub this is the blob SHA; it must accompany any update of an
/// existing path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionToken(String);

impl RevisionToken {
    /// Create a new RevisionToken
    ///
    /// # Errors
    /// Returns error if the token is empty or contains whitespace
    pub fn new(token: String) -> Result<Self, DomainError> {
        if token.is_empty() {
            return Err(DomainError::InvalidRevisionToken(
                "Revision token cannot be empty".to_string(),
            ));
        }

        if token.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidRevisionToken(format!(
                "Revision token contains whitespace: {token:?}"
            )));
        }

        Ok(Self(token))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RevisionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RevisionToken {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RevisionToken> for String {
    fn from(token: RevisionToken) -> Self {
        token.0
    }
}

/// Bearer token authorizing calls against the remote platform
///
/// The secret is never printed: both `Debug` and `Display` redact it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new AccessToken
    ///
    /// Surrounding whitespace (e.g. a trailing newline from a file or
    /// environment variable) is trimmed.
    ///
    /// # Errors
    /// Returns error if the token is empty
    pub fn new(token: impl Into<String>) -> Result<Self, DomainError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Access token cannot be empty".to_string(),
            ));
        }
        Ok(Self(token))
    }

    /// Expose the secret value for use in an Authorization header
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl Display for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
