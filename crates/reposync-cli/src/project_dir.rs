//! Directory-backed project store
//!
//! Implements [`IProjectStore`] by reading a directory tree: the directory
//! name becomes the project name and every regular file becomes a project
//! file named by its `/`-separated path relative to the root.
//!
//! `.git` directories and anything matching a configured ignore glob are
//! skipped. Globs are tested against both the relative path and the entry's
//! own name, so `*.log` and `node_modules` behave as expected at any depth.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use reposync_core::{
    domain::{OwnerLogin, Project, ProjectFile},
    ports::IProjectStore,
};
use tracing::{debug, instrument};

/// Directory names never included in a project
const ALWAYS_SKIPPED: &[&str] = &[".git"];

/// Loads projects from local directories
#[derive(Debug, Clone, Default)]
pub struct DirectoryProjectStore {
    ignore: Vec<glob::Pattern>,
    owner: Option<OwnerLogin>,
}

impl DirectoryProjectStore {
    /// Create a store honoring the given ignore globs
    ///
    /// # Errors
    /// Returns error if a pattern is not a valid glob
    pub fn new<S: AsRef<str>>(ignore: &[S]) -> Result<Self> {
        let ignore = ignore
            .iter()
            .map(|p| {
                glob::Pattern::new(p.as_ref())
                    .with_context(|| format!("Invalid ignore pattern {:?}", p.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            ignore,
            ..Self::default()
        })
    }

    /// Owner recorded on loaded projects
    #[must_use]
    pub fn with_owner(mut self, owner: Option<OwnerLogin>) -> Self {
        self.owner = owner;
        self
    }

    fn is_ignored(&self, relative: &str, entry_name: &str) -> bool {
        self.ignore
            .iter()
            .any(|p| p.matches(relative) || p.matches(entry_name))
    }

    /// Collects `(relative path, absolute path)` for every included file
    fn collect_files(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        let mut pending = vec![(root.to_path_buf(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let entries = std::fs::read_dir(&dir)
                .with_context(|| format!("Failed to read directory {}", dir.display()))?;
            for entry in entries {
                let entry = entry
                    .with_context(|| format!("Failed to read entry in {}", dir.display()))?;
                let entry_name = entry.file_name().to_string_lossy().into_owned();
                let relative = if prefix.is_empty() {
                    entry_name.clone()
                } else {
                    format!("{prefix}/{entry_name}")
                };

                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    if ALWAYS_SKIPPED.contains(&entry_name.as_str())
                        || self.is_ignored(&relative, &entry_name)
                    {
                        debug!(path = %relative, "Skipping directory");
                        continue;
                    }
                    pending.push((entry.path(), relative));
                } else if file_type.is_file() {
                    if self.is_ignored(&relative, &entry_name) {
                        debug!(path = %relative, "Skipping file");
                        continue;
                    }
                    files.push((relative, entry.path()));
                }
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    fn load_blocking(&self, root: &Path) -> Result<Project> {
        if !root.is_dir() {
            bail!("Not a directory: {}", root.display());
        }

        let name = directory_name(root)?;

        let mut files = Vec::new();
        for (relative, path) in self.collect_files(root)? {
            let content = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut file = ProjectFile::new(relative, content);
            if let Some(modified) = modified_at(&path) {
                file = file.with_updated_at(modified);
            }
            files.push(file);
        }

        Project::new(name, None, self.owner.clone(), files)
            .with_context(|| format!("Invalid project in {}", root.display()))
    }
}

#[async_trait::async_trait]
impl IProjectStore for DirectoryProjectStore {
    #[instrument(skip(self))]
    async fn load_project(&self, key: &str) -> Result<Project> {
        let store = self.clone();
        let root = PathBuf::from(key);
        let project = tokio::task::spawn_blocking(move || store.load_blocking(&root))
            .await
            .context("Project loading task failed")??;
        debug!(project = project.name(), files = project.files().len(), "Project loaded");
        Ok(project)
    }
}

/// The final component of the canonical path of `root`
fn directory_name(root: &Path) -> Result<String> {
    let canonical = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Cannot derive a project name from {}", root.display()))
}

fn modified_at(path: &Path) -> Option<DateTime<chrono::Utc>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(std::time::UNIX_EPOCH).ok()?;
    DateTime::from_timestamp(since_epoch.as_secs() as i64, since_epoch.subsec_nanos())
}
