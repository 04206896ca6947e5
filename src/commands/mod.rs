//! CLI command definitions and dispatch.

pub mod check;
pub mod fire;

use clap::{Parser, Subcommand};

use tushub_core::config::AppConfig;
use tushub_core::error::AppError;

/// TusHub upload lifecycle hook runner
#[derive(Debug, Parser)]
#[command(name = "tushub-hooks", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file, merged over `config/default.toml`
    #[arg(short, long)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Set up the configured hook backend and report the hook configuration
    Check,
    /// Dispatch a single hook event
    Fire(fire::FireArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Check => check::execute(&config).await,
            Commands::Fire(args) => fire::execute(args, &config).await,
        }
    }
}
