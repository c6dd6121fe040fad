//! CLI command definitions and dispatch.

pub mod notify;
pub mod openapi;
pub mod schedule;
pub mod user;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use mafs_core::config::AppConfig;
use mafs_core::error::AppError;
use mafs_database::Stores;

/// MAFS administration tooling
#[derive(Debug, Parser)]
#[command(name = "mafs-cli", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (`config/<env>.toml` over `config/default.toml`)
    #[arg(short, long, env = "MAFS_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// OpenAPI document checks
    Openapi(openapi::OpenApiArgs),
    /// Run notification jobs by hand
    Notify(notify::NotifyArgs),
    /// Inspect notification schedules
    Schedule(schedule::ScheduleArgs),
    /// User account helpers
    User(user::UserArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Openapi(args) => openapi::execute(args, self.format).await,
            Commands::Notify(args) => notify::execute(args, &self.env, self.format).await,
            Commands::Schedule(args) => schedule::execute(args, &self.env, self.format).await,
            Commands::User(args) => user::execute(args),
        }
    }
}

/// Helper: load configuration for an environment
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(env)
}

/// Helper: open the configured stores
pub async fn open_stores(config: &AppConfig) -> Result<Stores, AppError> {
    Stores::open(&config.database).await
}
