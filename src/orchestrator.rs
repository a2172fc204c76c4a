//! Turns detected mint events into trade sessions.
//!
//! The orchestrator drains a single-consumer channel fed by the listener.
//! Each event gets its own session task: apply the owner filter, then either
//! record a simulated buy or run the real buy / delayed-sell flow. Sessions
//! run concurrently and are tracked in a `JoinSet`, so dropping the
//! orchestrator task at shutdown also cancels sells still waiting out their
//! delay.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{error, info};

use crate::executor::TradeExecutor;
use crate::ledger::TradeLedger;
use crate::types::{Address, MintEvent, MintEventReceiver};

/// Trade-dispatch policy applied to every detected mint.
#[derive(Debug, Clone)]
pub struct TradePolicy {
    /// When set, only events whose payer equals this address are processed.
    pub owner_filter: Option<Address>,
    /// Record events instead of trading; no ledger-client call is made.
    pub simulate: bool,
    /// Hold bought tokens indefinitely instead of scheduling a sell.
    pub marry: bool,
    /// Delay between buy completion and the paired sell.
    pub sell_delay: Duration,
}

pub struct TradeOrchestrator {
    receiver: MintEventReceiver,
    policy: TradePolicy,
    executor: Option<Arc<dyn TradeExecutor>>,
    ledger: Arc<TradeLedger>,
    sessions: JoinSet<()>,
}

impl TradeOrchestrator {
    /// `executor` may be `None` only in simulate mode.
    pub fn new(
        receiver: MintEventReceiver,
        policy: TradePolicy,
        executor: Option<Arc<dyn TradeExecutor>>,
        ledger: Arc<TradeLedger>,
    ) -> Self {
        Self {
            receiver,
            policy,
            executor,
            ledger,
            sessions: JoinSet::new(),
        }
    }

    /// Drain the event channel, one concurrent session per event. Returns
    /// after the channel closes and every open session has finished.
    pub async fn run(mut self) {
        info!(
            "trade orchestrator running (simulate: {}, marry: {})",
            self.policy.simulate, self.policy.marry
        );

        while let Some(event) = self.receiver.recv().await {
            let policy = self.policy.clone();
            let executor = self.executor.clone();
            let ledger = Arc::clone(&self.ledger);
            self.sessions.spawn(async move {
                run_session(event, policy, executor, ledger).await;
            });
        }

        info!("mint event channel closed; draining open sessions");
        while self.sessions.join_next().await.is_some() {}
    }
}

/// One trade session, created per mint event and destroyed after its
/// terminal action. Events with identical mints are not deduplicated; each
/// gets an independent session.
async fn run_session(
    event: MintEvent,
    policy: TradePolicy,
    executor: Option<Arc<dyn TradeExecutor>>,
    ledger: Arc<TradeLedger>,
) {
    if let Some(owner) = &policy.owner_filter {
        if &event.payer != owner {
            info!(
                "skipping {}: payer {} does not match owner filter",
                event.mint, event.payer
            );
            return;
        }
    }

    if policy.simulate {
        info!("simulate mode: recording {} instead of buying", event.mint);
        if let Err(e) = ledger.record_simulation(&event).await {
            error!("failed recording simulated buy for {}: {e:#}", event.mint);
        }
        return;
    }

    let Some(executor) = executor else {
        error!(
            "real trade requested for {} but no executor is configured",
            event.mint
        );
        return;
    };

    if let Err(e) = executor
        .buy(
            &event.mint,
            &event.bonding_curve,
            &event.associated_bonding_curve,
        )
        .await
    {
        // A failed buy never schedules the paired sell.
        error!("buy failed for {}: {e:#}", event.mint);
        return;
    }

    if policy.marry {
        info!("married to {}; holding indefinitely", event.mint);
        return;
    }

    sleep(policy.sell_delay).await;
    match executor
        .sell(
            &event.mint,
            &event.bonding_curve,
            &event.associated_bonding_curve,
        )
        .await
    {
        Ok(signature) => info!("sold {}: {}", event.mint, signature),
        Err(e) => error!("sell failed for {}: {e:#}", event.mint),
    }
}
