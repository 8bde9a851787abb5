//! Contracts of the collaborators the governance core depends on but does
//! not implement: the value-transfer rail and the agent decision maker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{Address, Wallet};

/// What the rail hands back for a submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Base58 transaction signature.
    pub signature: String,
    /// Whether the rail reports the transfer as confirmed.
    pub confirmed: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RailError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Transfer rejected: {0}")]
    Validation(String),

    #[error("Insufficient balance: {available} lamports available, {requested} requested")]
    InsufficientBalance { available: u64, requested: u64 },
}

/// Moves value between two accounts.
#[async_trait]
pub trait TransferRail: Send + Sync {
    /// Submits a transfer signed by `from` and waits for its confirmation.
    async fn transfer(
        &self,
        from: &Wallet,
        to: &Address,
        lamports: u64,
    ) -> Result<TransferReceipt, RailError>;

    /// Independently re-checks a previously returned signature.
    /// `Ok(true)` only when the rail holds a confirmed, error-free transfer.
    async fn confirm(&self, signature: &str) -> Result<bool, RailError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("Decision backend unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed decision response: {0}")]
    Malformed(String),
}

/// Picks one of `options` given free-form `context`.
///
/// Implementations return the raw answer text; interpreting it (and falling
/// back when it can't be interpreted) is the caller's job.
#[async_trait]
pub trait DecisionMaker: Send + Sync {
    async fn decide(&self, prompt: &str, options: &[String]) -> Result<String, DecisionError>;
}
