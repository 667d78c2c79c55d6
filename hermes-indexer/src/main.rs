//! Hermes Indexer Entry Point
//!
//! Configuration is loaded from `HERMES_*` environment variables (via .env
//! file). Command-line arguments override environment variables.
//!
//! Usage:
//!   hermes-indexer              - Run the poll loop (auto-initializes schema)
//!   hermes-indexer --once       - Run a single pass and exit
//!   hermes-indexer init-schema  - Create the Postgres schema
//!   hermes-indexer health       - Print the lag report

use clap::Parser;
use hermes_indexer::{handler, telemetry, Cli, IndexerConfig};

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = IndexerConfig::from_env();
    cli.apply(&mut config);

    if let Err(e) = telemetry::init_logging(&config.log) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }

    if let Err(e) = handler::run(cli, config).await {
        tracing::error!(error = %e, "hermes-indexer failed");
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
