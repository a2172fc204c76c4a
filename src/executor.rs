//! Buy/sell execution against the pump.fun program.
//!
//! Each executed trade reads the bonding-curve price first (logged for
//! observability; it is not used to compute slippage bounds), builds an
//! instruction whose data is the 8-byte discriminator, submits it and, on
//! confirmation, appends the trade to the ledger.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::Keypair,
    signer::keypair::read_keypair_file,
    signer::Signer,
    transaction::Transaction,
};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::curve::decode_bonding_curve;
use crate::error::SniperError;
use crate::idl::DiscriminatorTable;
use crate::ledger::{TradeLedger, TradeSide};

/// Executes trades for detected mints. The seam exists so the orchestrator
/// can run against a mock in tests.
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    /// Buy the token; returns the confirmed transaction signature.
    async fn buy(
        &self,
        mint: &str,
        bonding_curve: &str,
        associated_bonding_curve: &str,
    ) -> Result<String>;

    /// Sell the token; returns the confirmed transaction signature.
    async fn sell(
        &self,
        mint: &str,
        bonding_curve: &str,
        associated_bonding_curve: &str,
    ) -> Result<String>;
}

/// Load the wallet keypair from its JSON secret file.
pub fn load_wallet(path: &str) -> Result<Keypair> {
    read_keypair_file(path).map_err(|e| anyhow!("failed to read wallet keypair from {path}: {e}"))
}

/// Real executor submitting transactions through the shared RPC client.
pub struct PumpExecutor {
    rpc: Arc<RpcClient>,
    wallet: Keypair,
    program_id: Pubkey,
    buy_discriminator: [u8; 8],
    sell_discriminator: [u8; 8],
    ledger: Arc<TradeLedger>,
    buy_cooldown: Duration,
}

impl PumpExecutor {
    pub fn new(
        rpc: Arc<RpcClient>,
        wallet: Keypair,
        program_id: &str,
        table: &DiscriminatorTable,
        ledger: Arc<TradeLedger>,
        buy_cooldown: Duration,
    ) -> Result<Self> {
        Ok(Self {
            rpc,
            wallet,
            program_id: Pubkey::from_str(program_id)
                .with_context(|| format!("invalid program id {program_id}"))?,
            buy_discriminator: discriminator_bytes(table, "buy")?,
            sell_discriminator: discriminator_bytes(table, "sell")?,
            ledger,
            buy_cooldown,
        })
    }

    async fn execute(
        &self,
        side: TradeSide,
        discriminator: [u8; 8],
        mint: &str,
        bonding_curve: &str,
        associated_bonding_curve: &str,
    ) -> Result<String> {
        let mint_key = Pubkey::from_str(mint).with_context(|| format!("invalid mint {mint}"))?;
        let bonding_curve_key = Pubkey::from_str(bonding_curve)
            .with_context(|| format!("invalid bonding curve {bonding_curve}"))?;
        let associated_key = Pubkey::from_str(associated_bonding_curve).with_context(|| {
            format!("invalid associated bonding curve {associated_bonding_curve}")
        })?;

        self.log_current_price(&bonding_curve_key).await;

        // Account ordering fixed by the pump.fun instruction layout.
        let instruction = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(self.wallet.pubkey(), true),
                AccountMeta::new(mint_key, false),
                AccountMeta::new(bonding_curve_key, false),
                AccountMeta::new(associated_key, false),
            ],
            data: discriminator.to_vec(),
        };

        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| SniperError::Submission(e.to_string()))?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.wallet.pubkey()),
            &[&self.wallet],
            blockhash,
        );

        let signature = self
            .rpc
            .send_and_confirm_transaction(&transaction)
            .await
            .map_err(|e| SniperError::Submission(e.to_string()))?;

        info!("{} confirmed for {}: {}", side.as_str(), mint, signature);
        self.ledger
            .record_trade(side, mint, &signature.to_string())
            .await?;
        Ok(signature.to_string())
    }

    /// Fetch and log the current curve price. Failures here are warnings:
    /// the price is observational and never gates the trade.
    async fn log_current_price(&self, bonding_curve: &Pubkey) {
        match self.rpc.get_account_data(bonding_curve).await {
            Ok(data) => match decode_bonding_curve(&data) {
                Ok(state) => info!(
                    "current price on curve {}: {} lamports",
                    bonding_curve, state.price_lamports
                ),
                Err(e) => warn!("could not decode bonding curve {}: {}", bonding_curve, e),
            },
            Err(e) => warn!("could not fetch bonding curve {}: {}", bonding_curve, e),
        }
    }
}

#[async_trait]
impl TradeExecutor for PumpExecutor {
    async fn buy(
        &self,
        mint: &str,
        bonding_curve: &str,
        associated_bonding_curve: &str,
    ) -> Result<String> {
        let signature = self
            .execute(
                TradeSide::Buy,
                self.buy_discriminator,
                mint,
                bonding_curve,
                associated_bonding_curve,
            )
            .await?;

        // Serialize rapid repeated buys.
        info!("buy cooldown {:?}", self.buy_cooldown);
        sleep(self.buy_cooldown).await;
        Ok(signature)
    }

    async fn sell(
        &self,
        mint: &str,
        bonding_curve: &str,
        associated_bonding_curve: &str,
    ) -> Result<String> {
        self.execute(
            TradeSide::Sell,
            self.sell_discriminator,
            mint,
            bonding_curve,
            associated_bonding_curve,
        )
        .await
    }
}

fn discriminator_bytes(table: &DiscriminatorTable, name: &str) -> Result<[u8; 8]> {
    let disc_hex = table
        .get(name)
        .ok_or_else(|| anyhow!("IDL has no `{name}` instruction"))?;
    let raw = hex::decode(disc_hex).context("invalid discriminator hex")?;
    <[u8; 8]>::try_from(raw.as_slice())
        .map_err(|_| anyhow!("discriminator for `{name}` is not 8 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_discriminator_bytes_from_table() {
        let table = DiscriminatorTable::derive(&json!({
            "instructions": [{ "name": "buy" }, { "name": "sell" }]
        }))
        .unwrap();

        assert_eq!(
            discriminator_bytes(&table, "buy").unwrap(),
            [0x66, 0x06, 0x3d, 0x12, 0x01, 0xda, 0xeb, 0xea]
        );
        assert!(discriminator_bytes(&table, "create").is_err());
    }
}
