//! Command Handlers

use std::sync::Arc;

use hermes_chain::RpcEventSource;
use hermes_store::{InMemoryStore, IndexerStore, PgStore, PgStoreConfig};
use tracing::info;

use crate::commands::{Cli, Commands, StoreBackend};
use crate::config::IndexerConfig;
use crate::controller::PollLoop;
use crate::error::{IndexerError, IndexerResult};
use crate::fetch::{GatewayFetcher, RetryConfig};
use crate::health::check_lag;

/// Run the selected command
pub async fn run(cli: Cli, config: IndexerConfig) -> IndexerResult<()> {
    match (cli.command(), cli.store) {
        (Commands::InitSchema, StoreBackend::Memory) => Err(IndexerError::config(
            "init-schema requires the postgres store",
        )),
        (Commands::InitSchema, StoreBackend::Postgres) => {
            let store = connect_postgres(&config).await?;
            store.init_schema().await?;
            println!("Database schema initialized successfully.");
            Ok(())
        }
        (Commands::Health, StoreBackend::Postgres) => {
            let store = connect_postgres(&config).await?;
            handle_health(&config, &store).await
        }
        (Commands::Health, StoreBackend::Memory) => {
            handle_health(&config, &InMemoryStore::new()).await
        }
        (Commands::Run, StoreBackend::Postgres) => {
            let store = connect_postgres(&config).await?;
            // Auto-create tables on first run
            store.init_schema().await?;
            handle_run(&config, cli.once, Arc::new(store)).await
        }
        (Commands::Run, StoreBackend::Memory) => {
            handle_run(&config, cli.once, Arc::new(InMemoryStore::new())).await
        }
    }
}

async fn connect_postgres(config: &IndexerConfig) -> IndexerResult<PgStore> {
    let pg_config =
        PgStoreConfig::new(config.database_url()?).with_max_connections(config.db_max_connections);
    Ok(PgStore::connect(&pg_config).await?)
}

async fn handle_health<D: IndexerStore>(config: &IndexerConfig, store: &D) -> IndexerResult<()> {
    if config.rpc_url.trim().is_empty() {
        return Err(IndexerError::config("HERMES_RPC_URL is required"));
    }
    let source = RpcEventSource::connect(&config.rpc_url)?;
    let report = check_lag(&source, store, &config.lag).await?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| IndexerError::config(format!("failed to render report: {e}")))?;
    println!("{json}");
    Ok(())
}

async fn handle_run<D: IndexerStore>(
    config: &IndexerConfig,
    once: bool,
    store: Arc<D>,
) -> IndexerResult<()> {
    config.validate()?;

    let source = Arc::new(RpcEventSource::connect(&config.rpc_url)?);
    let fetcher = Arc::new(GatewayFetcher::with_config(
        &config.ipfs_gateway,
        config.fetch_timeout_secs,
        RetryConfig::default(),
    ));

    let mut poll = PollLoop::new(
        config.poll.clone(),
        config.chain_id,
        config.factory()?,
        source,
        fetcher,
        store,
    )?;
    poll.resume().await?;

    if once {
        let report = poll.run_pass().await?;
        info!(
            from_block = report.from_block,
            to_block = ?report.to_block,
            applied = report.applied,
            skipped = report.skipped,
            quarantined = report.quarantined,
            "single pass complete"
        );
        return Ok(());
    }

    tokio::select! {
        _ = poll.run() => Ok(()),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| IndexerError::config(format!("failed to listen for shutdown: {e}")))?;
            info!("shutdown signal received");
            Ok(())
        }
    }
}
