//! pump-sniper binary: wires the listener, ledger and orchestrator together.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use tokio::sync::mpsc;
use tracing::{info, Level};

use pump_sniper::config::Config;
use pump_sniper::executor::{load_wallet, PumpExecutor, TradeExecutor};
use pump_sniper::idl::DiscriminatorTable;
use pump_sniper::ledger::TradeLedger;
use pump_sniper::listener::EventListener;
use pump_sniper::orchestrator::{TradeOrchestrator, TradePolicy};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = Config::from_env()?;
    info!(
        "starting pump-sniper (simulate: {}, marry: {})",
        config.simulate, config.marry
    );

    let idl_raw = tokio::fs::read_to_string(&config.idl_path)
        .await
        .with_context(|| format!("failed to read IDL from {}", config.idl_path))?;
    let idl: serde_json::Value = serde_json::from_str(&idl_raw).context("IDL is not valid JSON")?;
    let table = Arc::new(DiscriminatorTable::derive(&idl)?);
    info!("derived {} instruction discriminators", table.len());

    let ledger = Arc::new(TradeLedger::open(&config.db_path).await?);
    let rpc = Arc::new(RpcClient::new(config.http_url()?));

    // Simulate mode takes no on-chain action and must run without a wallet.
    let executor: Option<Arc<dyn TradeExecutor>> = if config.simulate {
        None
    } else {
        let wallet = load_wallet(&config.wallet_key_path)?;
        Some(Arc::new(PumpExecutor::new(
            Arc::clone(&rpc),
            wallet,
            &config.program_id,
            &table,
            Arc::clone(&ledger),
            Duration::from_millis(config.buy_cooldown_ms),
        )?))
    };

    let (event_sender, event_receiver) = mpsc::channel(256);

    let listener = EventListener::new(
        config.ws_url()?,
        config.program_id.clone(),
        Arc::clone(&table),
        Arc::clone(&rpc),
        Arc::clone(&ledger),
        event_sender,
        Duration::from_millis(config.reconnect_delay_ms),
    );
    let listener_handle = tokio::spawn(listener.run());

    let policy = TradePolicy {
        owner_filter: config.owner_filter.clone(),
        simulate: config.simulate,
        marry: config.marry,
        sell_delay: Duration::from_millis(config.sell_delay_ms),
    };
    let orchestrator = TradeOrchestrator::new(event_receiver, policy, executor, ledger);
    let orchestrator_handle = tokio::spawn(orchestrator.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed waiting for ctrl-c")?;
    info!("shutdown requested; cancelling listener and pending sessions");
    listener_handle.abort();
    orchestrator_handle.abort();

    Ok(())
}
