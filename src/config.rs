//! Process configuration, loaded from the environment (`.env` supported).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Mainnet pump.fun program.
pub const DEFAULT_PROGRAM_ID: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP RPC endpoint for transaction fetches and submissions. Derived
    /// from the websocket url when unset.
    pub rpc_http_url: Option<String>,
    /// WebSocket endpoint for logsSubscribe. Derived from the HTTP url when
    /// unset.
    pub rpc_ws_url: Option<String>,
    #[serde(default = "default_program_id")]
    pub program_id: String,
    #[serde(default = "default_idl_path")]
    pub idl_path: String,
    #[serde(default = "default_wallet_key_path")]
    pub wallet_key_path: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Pause after each confirmed buy, serializing rapid repeated buys.
    #[serde(default = "default_buy_cooldown_ms")]
    pub buy_cooldown_ms: u64,
    /// Delay between buy completion and the paired sell.
    #[serde(default = "default_sell_delay_ms")]
    pub sell_delay_ms: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Tolerated price movement. Carried on the trade surface; the detection
    /// pipeline does not read it.
    #[serde(default = "default_slippage")]
    pub slippage: f64,
    /// Log detected mints instead of buying them.
    #[serde(default)]
    pub simulate: bool,
    /// Never schedule sells for bought tokens.
    #[serde(default)]
    pub marry: bool,
    /// Only trade mints whose creating transaction was paid by this address.
    #[serde(default)]
    pub owner_filter: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        envy::from_env::<Config>().context("failed to load configuration from environment")
    }

    pub fn http_url(&self) -> Result<String> {
        if let Some(url) = &self.rpc_http_url {
            return Ok(url.clone());
        }
        let ws = self
            .rpc_ws_url
            .as_ref()
            .ok_or_else(|| anyhow!("set RPC_HTTP_URL or RPC_WS_URL"))?;
        Ok(ws
            .replacen("wss://", "https://", 1)
            .replacen("ws://", "http://", 1))
    }

    pub fn ws_url(&self) -> Result<String> {
        if let Some(url) = &self.rpc_ws_url {
            return Ok(url.clone());
        }
        let http = self
            .rpc_http_url
            .as_ref()
            .ok_or_else(|| anyhow!("set RPC_WS_URL or RPC_HTTP_URL"))?;
        Ok(http
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1))
    }
}

fn default_program_id() -> String {
    DEFAULT_PROGRAM_ID.to_string()
}

fn default_idl_path() -> String {
    "./idl/pump_fun_idl.json".to_string()
}

fn default_wallet_key_path() -> String {
    "./my-keypair.json".to_string()
}

fn default_db_path() -> String {
    "./sniper.db".to_string()
}

fn default_buy_cooldown_ms() -> u64 {
    15_000
}

fn default_sell_delay_ms() -> u64 {
    20_000
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_slippage() -> f64 {
    0.01
}
