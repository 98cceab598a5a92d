//! Repos command - List the most recently updated repositories

use anyhow::{Context, Result};
use clap::Args;
use reposync_core::ports::IRemoteConnector;
use tracing::info;

use super::{connector, require_credentials};
use crate::output::get_formatter;
use crate::AppContext;

#[derive(Debug, Args)]
pub struct ReposCommand {
    /// Maximum number of repositories to show (1-100)
    #[arg(long, short = 'n', default_value_t = 10, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub limit: u8,
}

impl ReposCommand {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);

        let credentials = require_credentials().await?;
        let client = connector(&ctx.config)
            .connect(&credentials)
            .await
            .context("Failed to connect to GitHub")?;

        info!(limit = self.limit, "Listing repositories");
        let repos = client
            .list_repositories(self.limit)
            .await
            .context("Failed to list repositories")?;

        if ctx.format.is_json() {
            let json = serde_json::to_value(&repos).context("Failed to serialize repositories")?;
            formatter.print_json(&json);
            return Ok(());
        }

        if repos.is_empty() {
            formatter.info("No repositories found");
            return Ok(());
        }

        let noun = if repos.len() == 1 { "repository" } else { "repositories" };
        formatter.success(&format!("{} {noun}", repos.len()));
        for repo in &repos {
            let visibility = if repo.private { "private" } else { "public" };
            let updated = repo
                .updated_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            formatter.info(&format!("{:<40} {:<8} {}", repo.full_name, visibility, updated));
            if let Some(description) = &repo.description {
                formatter.info(&format!("    {description}"));
            }
        }

        Ok(())
    }
}
