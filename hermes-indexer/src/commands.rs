//! Command-line interface definitions

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::IndexerConfig;
use crate::telemetry::LogFormat;

/// Hermes event indexer
#[derive(Debug, Parser)]
#[command(name = "hermes-indexer", version, about = "Index Hermes bounty contracts into Postgres")]
pub struct Cli {
    /// JSON-RPC endpoint (overrides HERMES_RPC_URL)
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Factory contract address (overrides HERMES_FACTORY_ADDRESS)
    #[arg(long, global = true)]
    pub factory_address: Option<String>,

    /// Chain id (overrides HERMES_CHAIN_ID)
    #[arg(long, global = true)]
    pub chain_id: Option<u64>,

    /// Postgres URL (overrides HERMES_DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Store backend
    #[arg(long, value_enum, default_value_t = StoreBackend::Postgres, global = true)]
    pub store: StoreBackend,

    /// Log output format (overrides HERMES_LOG_FORMAT)
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Log level (overrides HERMES_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Run a single pass and exit
    #[arg(long, global = true)]
    pub once: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the poll loop (default)
    Run,
    /// Create the Postgres schema
    InitSchema,
    /// Print the indexer lag report as JSON
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Postgres,
    /// Process-local store, lost on exit
    Memory,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }

    /// Apply command-line overrides on top of the environment
    pub fn apply(&self, config: &mut IndexerConfig) {
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(address) = &self.factory_address {
            config.factory_address = address.clone();
        }
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::parse_from(["hermes-indexer"]);
        assert_eq!(cli.command(), Commands::Run);
        assert_eq!(cli.store, StoreBackend::Postgres);
        assert!(!cli.once);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "hermes-indexer",
            "--once",
            "--store",
            "memory",
            "--log-format",
            "json",
            "--rpc-url",
            "http://localhost:8545",
            "--chain-id",
            "8453",
        ]);
        let mut config = IndexerConfig::default();
        cli.apply(&mut config);

        assert!(cli.once);
        assert_eq!(cli.store, StoreBackend::Memory);
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.chain_id, 8453);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::parse_from(["hermes-indexer", "health", "--store", "memory"]);
        assert_eq!(cli.command(), Commands::Health);

        let cli = Cli::parse_from(["hermes-indexer", "init-schema"]);
        assert_eq!(cli.command(), Commands::InitSchema);
    }
}
