//! # IdP Registry Main Entry Point
//!
//! This is the main entry point for the identity provider registry service.

use clap::{Parser, Subcommand};
use idp_registry::{
    config::ConfigLoader,
    db::{init_pool, run_migrations},
    seeds::seed_root_zone,
    server::run_server,
    telemetry::init_tracing,
};

/// Identity provider registry with cross-zone mirroring
#[derive(Debug, Parser)]
#[command(name = "idp-registry", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Start the HTTP API (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);

    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    init_tracing(&config)?;
    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;

    if matches!(command, Command::Migrate) {
        run_migrations(&db).await?;
        return Ok(());
    }

    if config.run_migrations {
        run_migrations(&db).await?;
    }

    if config.seed_root_zone {
        seed_root_zone(&db, &config.root_zone_id).await?;
    }

    run_server(config, db).await
}
