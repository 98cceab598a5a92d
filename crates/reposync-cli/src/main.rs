//! reposync CLI - Command-line interface for reposync
//!
//! Provides commands for:
//! - Pushing a local directory to a GitHub repository
//! - Listing recently updated repositories
//! - Managing the stored access token
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reposync_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod project_dir;

use commands::{
    auth::AuthCommand, completions::CompletionsCommand, config::ConfigCommand, push::PushCommand,
    repos::ReposCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "reposync",
    version,
    about = "Publish local projects as GitHub repositories"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Push a local directory to a repository
    Push(PushCommand),
    /// List your most recently updated repositories
    Repos(ReposCommand),
    /// Manage the stored access token
    #[command(subcommand)]
    Auth(AuthCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct AppContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    init_tracing(&cli, &config);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = AppContext {
        format,
        config_path,
        config,
    };

    match cli.command {
        Commands::Push(cmd) => cmd.execute(&ctx).await,
        Commands::Repos(cmd) => cmd.execute(&ctx).await,
        Commands::Auth(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}

/// `RUST_LOG` wins, then `-v`/`-q`, then `logging.level` from the config
fn init_tracing(cli: &Cli, config: &Config) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => config.logging.level.as_str(),
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
