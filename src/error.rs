//! Error taxonomy for the sniper pipeline.
//!
//! Component-level failures are expressed as [`SniperError`]; task and
//! application boundaries wrap them in `anyhow::Error` with context.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SniperError {
    /// The interface description is missing a usable `instructions` list.
    /// Fatal at startup.
    #[error("malformed interface description: {0}")]
    MalformedDescription(String),

    /// Bonding-curve account data too short to decode. Aborts the single
    /// price read only.
    #[error("bonding curve account data too short: {len} bytes")]
    TruncatedAccountData { len: usize },

    /// A detected `create` match lacked one of the required accounts.
    /// The event is discarded, the listener keeps running.
    #[error("create instruction missing required account: {0}")]
    MissingField(&'static str),

    /// Streaming transport failure; triggers a reconnect, never fatal.
    #[error("stream connection error: {0}")]
    Connection(String),

    /// The cluster rejected or failed to confirm a transaction. Aborts the
    /// current trade session only.
    #[error("transaction submission failed: {0}")]
    Submission(String),
}
