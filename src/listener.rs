//! WebSocket log listener.
//!
//! Maintains one `logsSubscribe` subscription filtered to the target program.
//! Every notification spawns an independent handler task that fetches the
//! referenced transaction, looks for a `create` instruction and, on a match,
//! persists a [`MintEvent`] and hands it to the orchestrator channel.
//!
//! Malformed messages and per-transaction failures are logged and never
//! terminate the stream. A closed or failed connection is re-established
//! after a fixed delay, indefinitely: eventual reconnection is preferred over
//! precise failure reporting.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Signature;
use solana_transaction_status::{
    EncodedTransaction, UiMessage, UiRawMessage, UiTransactionEncoding,
};
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::error::SniperError;
use crate::idl::DiscriminatorTable;
use crate::ledger::TradeLedger;
use crate::matcher::match_instructions;
use crate::types::{now_millis, Address, MintEvent, MintEventSender};

/// Instruction whose matches produce mint events.
const CREATE_INSTRUCTION: &str = "create";

// Account positions inside the pump.fun `create` instruction. These come
// from the deployed program's account ordering, not from the IDL; revalidate
// after a program upgrade.
const MINT_INDEX: usize = 0;
const BONDING_CURVE_INDEX: usize = 2;
const ASSOCIATED_BONDING_CURVE_INDEX: usize = 3;

pub struct EventListener {
    ws_url: String,
    program_id: String,
    table: Arc<DiscriminatorTable>,
    rpc: Arc<RpcClient>,
    ledger: Arc<TradeLedger>,
    event_sender: MintEventSender,
    reconnect_delay: Duration,
}

impl EventListener {
    pub fn new(
        ws_url: String,
        program_id: String,
        table: Arc<DiscriminatorTable>,
        rpc: Arc<RpcClient>,
        ledger: Arc<TradeLedger>,
        event_sender: MintEventSender,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            ws_url,
            program_id,
            table,
            rpc,
            ledger,
            event_sender,
            reconnect_delay,
        }
    }

    /// Connection loop: connect, subscribe, drain notifications; on any
    /// close wait the fixed delay and reconnect. Runs until aborted.
    pub async fn run(self) {
        info!("event listener starting for program {}", self.program_id);
        loop {
            match self.connect_and_listen().await {
                Ok(()) => warn!("log stream closed"),
                Err(e) => warn!("log stream error: {e:#}"),
            }
            info!("reconnecting in {:?}", self.reconnect_delay);
            sleep(self.reconnect_delay).await;
        }
    }

    async fn connect_and_listen(&self) -> Result<()> {
        let (mut ws, _response) = connect_async(self.ws_url.as_str())
            .await
            .with_context(|| format!("failed connecting to {}", self.ws_url))?;

        let request = subscription_request(&self.program_id);
        ws.send(Message::Text(request.to_string().into()))
            .await
            .context("failed sending logsSubscribe request")?;
        info!("subscribed to logs mentioning {}", self.program_id);

        while let Some(frame) = ws.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if let Some(signature) = parse_notification_signature(text.as_str()) {
                        self.spawn_notification_handler(signature);
                    }
                }
                Ok(Message::Ping(payload)) => {
                    ws.send(Message::Pong(payload))
                        .await
                        .context("failed answering ping")?;
                }
                Ok(Message::Close(frame)) => {
                    warn!("server closed the log stream: {frame:?}");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => return Err(SniperError::Connection(e.to_string()).into()),
            }
        }
        Ok(())
    }

    /// Each notification is handled in its own task so a slow transaction
    /// fetch never stalls the stream.
    fn spawn_notification_handler(&self, signature: String) {
        let rpc = Arc::clone(&self.rpc);
        let table = Arc::clone(&self.table);
        let ledger = Arc::clone(&self.ledger);
        let sender = self.event_sender.clone();
        let program_id = self.program_id.clone();

        tokio::spawn(async move {
            if let Err(e) =
                handle_notification(rpc, table, ledger, sender, &program_id, &signature).await
            {
                warn!("failed handling notification {signature}: {e:#}");
            }
        });
    }
}

async fn handle_notification(
    rpc: Arc<RpcClient>,
    table: Arc<DiscriminatorTable>,
    ledger: Arc<TradeLedger>,
    sender: MintEventSender,
    program_id: &str,
    signature: &str,
) -> Result<()> {
    let parsed = Signature::from_str(signature)
        .with_context(|| format!("notification carried invalid signature {signature}"))?;

    let config = RpcTransactionConfig {
        encoding: Some(UiTransactionEncoding::Json),
        commitment: Some(CommitmentConfig::confirmed()),
        max_supported_transaction_version: Some(0),
    };
    let fetched = rpc
        .get_transaction_with_config(&parsed, config)
        .await
        .with_context(|| format!("failed fetching transaction {signature}"))?;

    let EncodedTransaction::Json(transaction) = fetched.transaction.transaction else {
        return Ok(());
    };
    let UiMessage::Raw(message) = transaction.message else {
        return Ok(());
    };

    let Some(event) = extract_mint_event(&message, program_id, &table, signature)? else {
        return Ok(());
    };

    info!(
        "new minted token detected: {} (curve {})",
        event.mint, event.bonding_curve
    );
    ledger.record_mint_event(&event).await?;
    sender
        .send(event)
        .await
        .context("orchestrator channel closed")?;
    Ok(())
}

/// Pull a MintEvent out of a raw transaction message, if it contains a
/// `create` instruction of the target program.
///
/// Only the first qualifying match per transaction is taken. Returns
/// `Ok(None)` when there is no match, [`SniperError::MissingField`] when a
/// match lacks one of the three positional accounts.
pub fn extract_mint_event(
    message: &UiRawMessage,
    program_id: &str,
    table: &DiscriminatorTable,
    signature: &str,
) -> Result<Option<MintEvent>, SniperError> {
    let Some(matched) = match_instructions(message, program_id, table)
        .find(|m| m.name == CREATE_INSTRUCTION)
    else {
        return Ok(None);
    };

    let mint = required_key(&matched.account_keys, MINT_INDEX, "mint")?;
    let bonding_curve = required_key(&matched.account_keys, BONDING_CURVE_INDEX, "bonding_curve")?;
    let associated_bonding_curve = required_key(
        &matched.account_keys,
        ASSOCIATED_BONDING_CURVE_INDEX,
        "associated_bonding_curve",
    )?;
    let payer = message
        .account_keys
        .first()
        .filter(|k| !k.is_empty())
        .cloned()
        .ok_or(SniperError::MissingField("payer"))?;

    Ok(Some(MintEvent {
        mint,
        bonding_curve,
        associated_bonding_curve,
        payer,
        signature: signature.to_string(),
        created_at: now_millis(),
    }))
}

fn required_key(
    keys: &[Address],
    index: usize,
    field: &'static str,
) -> Result<Address, SniperError> {
    keys.get(index)
        .filter(|k| !k.is_empty())
        .cloned()
        .ok_or(SniperError::MissingField(field))
}

/// The single subscription request sent once per connection lifetime.
pub fn subscription_request(program_id: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [program_id] },
            { "commitment": "confirmed" }
        ]
    })
}

/// Extract the transaction signature from an inbound `logsNotification`.
///
/// Subscription acks, other methods and unparseable frames yield `None` and
/// are otherwise ignored. Both the flat `params.result.signature` shape and
/// the context-wrapped `params.result.value.signature` shape are accepted.
pub fn parse_notification_signature(text: &str) -> Option<String> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!("skipping unparseable ws message: {e}");
            return None;
        }
    };

    if let (Some(id), Some(result)) = (value.get("id"), value.get("result")) {
        debug!(id = ?id, subscription = ?result, "logsSubscribe acknowledged");
        return None;
    }

    if value.get("method").and_then(Value::as_str) != Some("logsNotification") {
        return None;
    }

    value
        .pointer("/params/result/signature")
        .or_else(|| value.pointer("/params/result/value/signature"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
