//! Config command - View and manage reposync configuration
//!
//! Provides the `reposync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Prints the configuration file path
//! 3. Sets individual configuration values via dot-notation keys
//! 4. Validates the configuration file and reports errors

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use reposync_core::config::Config;
use tracing::info;

use crate::output::{get_formatter, plural, OutputFormatter};
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "sync.concurrency")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("remote.api_base_url", "API endpoint"),
    ("remote.user_agent", "User-Agent header"),
    ("remote.request_timeout_secs", "Per-request timeout (seconds)"),
    ("remote.auto_init", "Create repositories with an initial commit"),
    ("sync.concurrency", "Parallel uploads"),
    ("sync.on_conflict", "fail|reuse-existing"),
    ("sync.default_description", "Description when none is given"),
    ("sync.commit_message", "Template with {path} and {project}"),
    ("sync.ignore", "Comma-separated ignore globs"),
    ("retry.max_attempts", "Attempts per file"),
    ("retry.base_delay_ms", "First backoff delay"),
    ("retry.max_delay_ms", "Backoff cap"),
    ("rate_limiting.requests_per_second", "Sustained API rate"),
    ("rate_limiting.burst", "Burst size"),
    ("rate_limiting.content_writes_per_minute", "File write rate"),
    ("committer.name", "Committer name (empty to unset)"),
    ("committer.email", "Committer email (empty to unset)"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.format", "pretty|json"),
];

impl ConfigCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        match self {
            ConfigCommand::Show => self.execute_show(ctx, &*formatter),
            ConfigCommand::Path => {
                if ctx.format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "config_path": ctx.config_path.display().to_string(),
                        "exists": ctx.config_path.exists(),
                    }));
                } else {
                    println!("{}", ctx.config_path.display());
                }
                Ok(())
            }
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value, &*formatter),
            ConfigCommand::Validate => self.execute_validate(ctx, &*formatter),
        }
    }

    fn execute_show(&self, ctx: &AppContext, formatter: &dyn OutputFormatter) -> Result<()> {
        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.format.is_json() {
            let json = serde_json::to_value(&ctx.config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");
            let yaml = serde_yaml::to_string(&ctx.config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    fn execute_set(
        &self,
        ctx: &AppContext,
        key: &str,
        value: &str,
        formatter: &dyn OutputFormatter,
    ) -> Result<()> {
        let mut config = ctx.config.clone();
        info!(key, value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            formatter.error(&format!("Failed to set '{key}': {e}"));
            formatter.info("");
            formatter.info("Supported keys:");
            for (key, help) in SUPPORTED_KEYS {
                formatter.info(&format!("  {key:<42} - {help}"));
            }
            bail!("Unknown or invalid configuration value");
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!("Invalid value for '{key}': {}", messages.join("; "));
        }

        if let Some(parent) = ctx.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(&ctx.config_path, yaml).context("Failed to write configuration file")?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {key} = {value}"));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }
        Ok(())
    }

    fn execute_validate(&self, ctx: &AppContext, formatter: &dyn OutputFormatter) -> Result<()> {
        let path = &ctx.config_path;

        if !path.exists() {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": true,
                    "config_path": path.display().to_string(),
                    "errors": [],
                    "note": "Configuration file not found. Using defaults.",
                }));
            } else {
                formatter.info(&format!("Configuration file not found at {}", path.display()));
                formatter.info("Using default configuration.");
            }
            return Ok(());
        }

        // Load explicitly; the context holds defaults when parsing failed
        let config = match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                if ctx.format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": path.display().to_string(),
                        "errors": [format!("{e:#}")],
                    }));
                } else {
                    formatter.error(&format!("{e:#}"));
                }
                bail!("Configuration could not be parsed");
            }
        };

        info!(config_path = %path.display(), "Validating configuration");
        let errors = config.validate();

        if ctx.format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(ToString::to_string).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                plural(errors.len())
            ));
            formatter.info(&format!("File: {}", path.display()));
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!("Configuration is invalid")
        }
    }
}

/// Apply a dot-notation key/value pair to a Config
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
        value
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("Expected a non-negative integer for {key}"))
    }

    fn optional(value: &str) -> Option<String> {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    match key {
        // --- remote ---
        "remote.api_base_url" => config.remote.api_base_url = value.to_string(),
        "remote.user_agent" => config.remote.user_agent = value.to_string(),
        "remote.request_timeout_secs" => config.remote.request_timeout_secs = number(key, value)?,
        "remote.auto_init" => {
            config.remote.auto_init = value
                .parse::<bool>()
                .with_context(|| format!("Expected true or false for {key}"))?;
        }

        // --- sync ---
        "sync.concurrency" => config.sync.concurrency = number(key, value)?,
        "sync.on_conflict" => {
            config.sync.on_conflict = value.parse().context("Expected fail or reuse-existing")?;
        }
        "sync.default_description" => config.sync.default_description = value.to_string(),
        "sync.commit_message" => config.sync.commit_message = value.to_string(),
        "sync.ignore" => {
            config.sync.ignore = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        // --- retry ---
        "retry.max_attempts" => config.retry.max_attempts = number(key, value)?,
        "retry.base_delay_ms" => config.retry.base_delay_ms = number(key, value)?,
        "retry.max_delay_ms" => config.retry.max_delay_ms = number(key, value)?,

        // --- rate_limiting ---
        "rate_limiting.requests_per_second" => {
            config.rate_limiting.requests_per_second = number(key, value)?;
        }
        "rate_limiting.burst" => config.rate_limiting.burst = number(key, value)?,
        "rate_limiting.content_writes_per_minute" => {
            config.rate_limiting.content_writes_per_minute = number(key, value)?;
        }

        // --- committer ---
        "committer.name" => config.committer.name = optional(value),
        "committer.email" => config.committer.email = optional(value),

        // --- logging ---
        "logging.level" => config.logging.level = value.to_lowercase(),
        "logging.format" => config.logging.format = value.to_lowercase(),

        _ => bail!("Unknown configuration key: {key}"),
    }
    Ok(())
}
