//! Project and ProjectFile entities
//!
//! A [`Project`] is the local unit of synchronization: a named, ordered
//! collection of files destined for one remote repository.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};

use super::errors::DomainError;
use super::newtypes::{OwnerLogin, ProjectId, RemotePath};

/// A single file belonging to a project
#[derive(Clone, PartialEq, Eq)]
pub struct ProjectFile {
    name: String,
    content: Vec<u8>,
    updated_at: Option<DateTime<Utc>>,
}

impl ProjectFile {
    /// Create a file from raw bytes
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            updated_at: None,
        }
    }

    /// Create a file from textual content
    pub fn from_text(name: impl Into<String>, content: impl AsRef<str>) -> Self {
        Self::new(name, content.as_ref().as_bytes().to_vec())
    }

    /// Attach a last-modified timestamp
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// The file name as supplied (before normalization)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file content
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// When the file was last modified locally, if known
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// The normalized path this file is written to in the remote repository
    ///
    /// # Errors
    /// Returns error if the name cannot be normalized
    pub fn remote_path(&self) -> Result<RemotePath, DomainError> {
        RemotePath::normalize(&self.name)
    }
}

impl fmt::Debug for ProjectFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectFile")
            .field("name", &self.name)
            .field("size", &self.content.len())
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// A local project to be materialized as a remote repository
#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    name: String,
    description: Option<String>,
    owner: Option<OwnerLogin>,
    files: Vec<ProjectFile>,
}

impl Project {
    /// Create a new project
    ///
    /// `owner` may be `None`, in which case the sync engine uses the identity
    /// the credentials authenticate as.
    ///
    /// # Errors
    /// Returns error if the name is blank, a file name cannot be normalized,
    /// or two files normalize to the same remote path
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        owner: Option<OwnerLogin>,
        files: Vec<ProjectFile>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Project name cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(files.len());
        for file in &files {
            let path = file.remote_path()?;
            if !seen.insert(path.clone()) {
                return Err(DomainError::DuplicateFileName(path.into()));
            }
        }

        Ok(Self {
            id: ProjectId::new(),
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            owner,
            files,
        })
    }

    /// Replace the generated identifier with a known one
    #[must_use]
    pub fn with_id(mut self, id: ProjectId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn owner(&self) -> Option<&OwnerLogin> {
        self.owner.as_ref()
    }

    /// Files in their original order
    pub fn files(&self) -> &[ProjectFile] {
        &self.files
    }

    /// Keep only the files for which `keep` returns true, preserving order
    ///
    /// Used to re-run a sync for the failed subset of a previous report.
    pub fn retain_files<F>(&mut self, keep: F)
    where
        F: FnMut(&ProjectFile) -> bool,
    {
        self.files.retain(keep);
    }
}
