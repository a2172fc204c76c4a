//! pump-sniper — pump.fun mint detection and automated trading.
//!
//! The pipeline: a WebSocket [`listener`] holds a `logsSubscribe`
//! subscription mentioning the pump.fun program, recognizes `create`
//! instructions by their Anchor discriminator ([`idl`], [`matcher`]),
//! persists each detected mint ([`ledger`]) and hands it to the
//! [`orchestrator`], which either records a simulated buy or drives the
//! real buy / delayed-sell flow through the [`executor`].

pub mod config;
pub mod curve;
pub mod error;
pub mod executor;
pub mod idl;
pub mod ledger;
pub mod listener;
pub mod matcher;
pub mod orchestrator;
pub mod types;

// Re-export main types for convenience
pub use error::SniperError;
pub use types::{Address, MintEvent};
