use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use agentdao_common::utils::amount::as_sol;

/// Identifier of a payment requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    pub fn new() -> Self {
        PaymentId(Uuid::new_v4())
    }

    /// First eight characters, used in log lines.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// A minted, time-boxed authorization for a fixed amount tied to a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub id: PaymentId,
    pub protocol: String,
    pub version: String,
    pub network: String,
    /// Lamports.
    pub amount: u64,
    pub description: String,
    /// Action being paid for, e.g. `dao/join` or `dao/proposal/3/vote`.
    pub resource: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: PaymentStatus,
    pub signature: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl PaymentRequest {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn summary(&self) -> PaymentSummary {
        PaymentSummary {
            id: self.id,
            amount: self.amount,
            description: self.description.clone(),
            status: self.status,
            timestamp: self.created_at,
            signature: self.signature.clone(),
        }
    }
}

/// Interop shape of a payment: `{id, amount, description, status, timestamp, signature}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub id: PaymentId,
    #[serde(with = "as_sol")]
    pub amount: u64,
    pub description: String,
    pub status: PaymentStatus,
    pub timestamp: DateTime<Utc>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
    /// Sum of completed amounts.
    #[serde(with = "as_sol")]
    pub total_volume: u64,
}

/// Proof handed back by a successful `verify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    pub id: PaymentId,
    pub amount: u64,
    pub signature: String,
}
