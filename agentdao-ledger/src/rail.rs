use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use agentdao_common::auth::wallet::verify_signature;
use agentdao_common::ports::{RailError, TransferReceipt, TransferRail};
use agentdao_common::{Address, Wallet};

#[derive(Debug, Clone)]
struct TransferRecord {
    lamports: u64,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct Faults {
    fail_next: u32,
    withhold_next: u32,
    confirmations_offline: bool,
}

#[derive(Debug, Default)]
struct RailState {
    balances: HashMap<Address, u64>,
    transfers: HashMap<String, TransferRecord>,
    nonce: u64,
    faults: Faults,
}

#[derive(Serialize)]
struct TransferMessage<'a> {
    from: &'a Address,
    to: &'a Address,
    lamports: u64,
    nonce: u64,
}

/// In-process transfer network with per-account balances.
///
/// Transfers are signed by the payer wallet and indexed by their base58
/// signature so `confirm` can look them up later. Faults can be injected
/// to exercise every failure path of the payment ledger.
#[derive(Debug, Default)]
pub struct SimulatedRail {
    state: RwLock<RailState>,
    latency: Duration,
}

impl SimulatedRail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to every transfer before it lands.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Credits `lamports` to `account` out of thin air (airdrop).
    pub async fn fund(&self, account: &Address, lamports: u64) {
        let mut state = self.state.write().await;
        *state.balances.entry(account.clone()).or_default() += lamports;
    }

    pub async fn balance(&self, account: &Address) -> u64 {
        self.state.read().await.balances.get(account).copied().unwrap_or(0)
    }

    /// The next `n` transfers fail with a network error.
    pub async fn fail_next_transfers(&self, n: u32) {
        self.state.write().await.faults.fail_next = n;
    }

    /// The next `n` transfers are accepted but reported unconfirmed; no funds move.
    pub async fn withhold_next_confirmations(&self, n: u32) {
        self.state.write().await.faults.withhold_next = n;
    }

    /// While offline, `confirm` errors instead of answering.
    pub async fn set_confirmations_offline(&self, offline: bool) {
        self.state.write().await.faults.confirmations_offline = offline;
    }

    /// Drops a transfer from the rail's history, as if it never landed.
    pub async fn forget(&self, signature: &str) -> bool {
        self.state.write().await.transfers.remove(signature).is_some()
    }

    pub async fn transfer_count(&self) -> usize {
        self.state.read().await.transfers.len()
    }
}

#[async_trait]
impl TransferRail for SimulatedRail {
    async fn transfer(
        &self,
        from: &Wallet,
        to: &Address,
        lamports: u64,
    ) -> Result<TransferReceipt, RailError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let from_address = from.address();
        let mut state = self.state.write().await;

        if state.faults.fail_next > 0 {
            state.faults.fail_next -= 1;
            warn!("🌐 Injected network failure for transfer from {}", from_address.short());
            return Err(RailError::Network("connection reset by peer".to_string()));
        }

        if lamports == 0 {
            return Err(RailError::Validation("transfer amount must be positive".to_string()));
        }

        let available = state.balances.get(&from_address).copied().unwrap_or(0);
        if available < lamports {
            return Err(RailError::InsufficientBalance { available, requested: lamports });
        }

        state.nonce += 1;
        let message = serde_json::to_vec(&TransferMessage {
            from: &from_address,
            to,
            lamports,
            nonce: state.nonce,
        })
        .map_err(|e| RailError::Validation(e.to_string()))?;

        let raw_signature = from.sign(&message);
        if !verify_signature(&from_address, &message, &raw_signature) {
            return Err(RailError::Validation("invalid transfer signature".to_string()));
        }
        let signature = bs58::encode(raw_signature).into_string();

        let confirmed = if state.faults.withhold_next > 0 {
            state.faults.withhold_next -= 1;
            false
        } else {
            true
        };

        if confirmed {
            if let Some(balance) = state.balances.get_mut(&from_address) {
                *balance -= lamports;
            }
            *state.balances.entry(to.clone()).or_default() += lamports;
        }

        debug!(
            "🔗 Transfer {} {} -> {} ({} lamports, confirmed: {})",
            &signature[..signature.len().min(8)],
            from_address.short(),
            to.short(),
            lamports,
            confirmed
        );

        state.transfers.insert(
            signature.clone(),
            TransferRecord { lamports, confirmed },
        );

        Ok(TransferReceipt { signature, confirmed })
    }

    async fn confirm(&self, signature: &str) -> Result<bool, RailError> {
        let state = self.state.read().await;
        if state.faults.confirmations_offline {
            return Err(RailError::Network("rpc node unreachable".to_string()));
        }
        Ok(state
            .transfers
            .get(signature)
            .map(|record| record.confirmed && record.lamports > 0)
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transfer_moves_balance_and_confirms() {
        let rail = SimulatedRail::new();
        let payer = Wallet::generate();
        let payee = Wallet::generate().address();
        rail.fund(&payer.address(), 1_000).await;

        let receipt = rail.transfer(&payer, &payee, 400).await.unwrap();
        assert!(receipt.confirmed);
        assert_eq!(rail.balance(&payer.address()).await, 600);
        assert_eq!(rail.balance(&payee).await, 400);
        assert!(rail.confirm(&receipt.signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_insufficient_balance_rejected() {
        let rail = SimulatedRail::new();
        let payer = Wallet::generate();
        rail.fund(&payer.address(), 10).await;

        let err = rail.transfer(&payer, &Wallet::generate().address(), 11).await.unwrap_err();
        assert_eq!(err, RailError::InsufficientBalance { available: 10, requested: 11 });
        assert_eq!(rail.transfer_count().await, 0);
    }

    #[tokio::test]
    async fn test_withheld_confirmation_moves_nothing() {
        let rail = SimulatedRail::new();
        let payer = Wallet::generate();
        let payee = Wallet::generate().address();
        rail.fund(&payer.address(), 100).await;
        rail.withhold_next_confirmations(1).await;

        let receipt = rail.transfer(&payer, &payee, 50).await.unwrap();
        assert!(!receipt.confirmed);
        assert_eq!(rail.balance(&payer.address()).await, 100);
        assert!(!rail.confirm(&receipt.signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_forgotten_receipt_no_longer_confirms() {
        let rail = SimulatedRail::new();
        let payer = Wallet::generate();
        rail.fund(&payer.address(), 100).await;

        let receipt = rail.transfer(&payer, &Wallet::generate().address(), 50).await.unwrap();
        assert!(rail.forget(&receipt.signature).await);
        assert!(!rail.confirm(&receipt.signature).await.unwrap());
        assert!(!rail.confirm("unknown").await.unwrap());
    }
}
