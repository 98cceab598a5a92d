//! Configuration module for reposync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{Committer, ConflictPolicy, SyncOptions, DEFAULT_COMMIT_MESSAGE};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for reposync.
///
/// Every section is optional in the YAML file; missing sections and fields
/// take their default values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub retry: RetryConfig,
    pub rate_limiting: RateLimitingConfig,
    pub committer: CommitterConfig,
    pub logging: LoggingConfig,
}

/// Remote platform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the REST API.
    pub api_base_url: String,
    /// Value of the `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Create an initial commit when creating a repository.
    pub auto_init: bool,
}

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of parallel uploads.
    pub concurrency: usize,
    /// What to do when the repository name is taken: `fail` or `reuse-existing`.
    pub on_conflict: ConflictPolicy,
    /// Description used when neither the caller nor the project supplies one.
    pub default_description: String,
    /// Commit message template; `{path}` and `{project}` are substituted.
    pub commit_message: String,
    /// Glob patterns of files to leave out when reading a project directory.
    pub ignore: Vec<String>,
}

/// Per-file retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum upload attempts per file, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single retry delay, in milliseconds.
    pub max_delay_ms: u64,
}

/// Client-side rate limiting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Sustained request rate for ordinary API calls.
    pub requests_per_second: u32,
    /// Number of requests allowed in a burst.
    pub burst: u32,
    /// Sustained rate of content-creating requests (file writes, repo creation).
    pub content_writes_per_minute: u32,
}

/// Identity recorded as the committer of uploaded files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitterConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/reposync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("reposync")
            .join("config.yaml")
    }

    /// Sync options seeded from this configuration.
    ///
    /// The committer is included only when both name and email are set.
    pub fn sync_options(&self) -> SyncOptions {
        let committer = match (&self.committer.name, &self.committer.email) {
            (Some(name), Some(email)) => Committer::new(name.clone(), email.clone()).ok(),
            _ => None,
        };

        SyncOptions {
            concurrency: self.sync.concurrency,
            on_conflict: self.sync.on_conflict,
            commit_message: Some(self.sync.commit_message.clone()),
            committer,
            ..SyncOptions::default()
        }
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            user_agent: format!("reposync/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            auto_init: true,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: crate::domain::DEFAULT_CONCURRENCY,
            on_conflict: ConflictPolicy::Fail,
            default_description: "Created with reposync".to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            ignore: Vec::new(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst: 20,
            content_writes_per_minute: 80,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.concurrency"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ValidationError {
                field: field.into(),
                message,
            });
        };

        // --- remote ---
        let base = self.remote.api_base_url.as_str();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            push(
                "remote.api_base_url",
                format!("must be an http(s) URL: {base}"),
            );
        }
        if self.remote.user_agent.trim().is_empty() {
            push("remote.user_agent", "must not be empty".into());
        }
        if self.remote.request_timeout_secs == 0 {
            push("remote.request_timeout_secs", "must be greater than 0".into());
        }

        // --- sync ---
        if self.sync.concurrency == 0 {
            push("sync.concurrency", "must be greater than 0".into());
        }
        if self.sync.commit_message.trim().is_empty() {
            push("sync.commit_message", "must not be empty".into());
        }
        for pattern in &self.sync.ignore {
            if let Err(e) = glob::Pattern::new(pattern) {
                push("sync.ignore", format!("invalid glob {pattern:?}: {e}"));
            }
        }

        // --- retry ---
        if self.retry.max_attempts == 0 {
            push("retry.max_attempts", "must be greater than 0".into());
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            push(
                "retry.max_delay_ms",
                format!(
                    "must be at least retry.base_delay_ms ({})",
                    self.retry.base_delay_ms
                ),
            );
        }

        // --- rate_limiting ---
        if self.rate_limiting.requests_per_second == 0 {
            push(
                "rate_limiting.requests_per_second",
                "must be greater than 0".into(),
            );
        }
        if self.rate_limiting.burst == 0 {
            push("rate_limiting.burst", "must be greater than 0".into());
        }
        if self.rate_limiting.content_writes_per_minute == 0 {
            push(
                "rate_limiting.content_writes_per_minute",
                "must be greater than 0".into(),
            );
        }

        // --- committer ---
        match (&self.committer.name, &self.committer.email) {
            (None, None) => {}
            (Some(name), Some(email)) => {
                if let Err(e) = Committer::new(name.clone(), email.clone()) {
                    push("committer", e.to_string());
                }
            }
            _ => push(
                "committer",
                "name and email must be set together".into(),
            ),
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            push(
                "logging.level",
                format!(
                    "invalid level '{}', expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            );
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            push(
                "logging.format",
                format!(
                    "invalid format '{}', expected one of: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            );
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Config`], starting from defaults.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from [`Config::default`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.api_base_url = url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.remote.user_agent = user_agent.into();
        self
    }

    pub fn request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.request_timeout_secs = seconds;
        self
    }

    pub fn auto_init(mut self, auto_init: bool) -> Self {
        self.config.remote.auto_init = auto_init;
        self
    }

    // --- sync ---

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.sync.concurrency = n;
        self
    }

    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.config.sync.on_conflict = policy;
        self
    }

    pub fn commit_message(mut self, template: impl Into<String>) -> Self {
        self.config.sync.commit_message = template.into();
        self
    }

    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.config.sync.ignore.push(pattern.into());
        self
    }

    // --- retry ---

    pub fn retry_max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn retry_delays_ms(mut self, base: u64, max: u64) -> Self {
        self.config.retry.base_delay_ms = base;
        self.config.retry.max_delay_ms = max;
        self
    }

    // --- committer ---

    pub fn committer(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.config.committer.name = Some(name.into());
        self.config.committer.email = Some(email.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
