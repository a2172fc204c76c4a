//! Core types shared across the sniper pipeline.

use serde::{Deserialize, Serialize};

/// A base58 account address, kept as a string until the submission boundary
/// where executors parse it into a `solana_sdk` pubkey.
pub type Address = String;

/// A newly minted token detected from a pump.fun `create` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintEvent {
    /// The mint address of the new token
    pub mint: Address,
    /// The account holding the token's pricing/liquidity state
    pub bonding_curve: Address,
    /// The token account tied to the bonding curve
    pub associated_bonding_curve: Address,
    /// Fee payer of the transaction that created the token
    pub payer: Address,
    /// Signature of the creating transaction
    pub signature: String,
    /// Unix timestamp in milliseconds when the event was detected
    pub created_at: u64,
}

/// Channel for handing detected mint events to the orchestrator.
pub type MintEventSender = tokio::sync::mpsc::Sender<MintEvent>;
pub type MintEventReceiver = tokio::sync::mpsc::Receiver<MintEvent>;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
