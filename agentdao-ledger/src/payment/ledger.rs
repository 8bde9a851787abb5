use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use agentdao_common::ports::{TransferReceipt, TransferRail};
use agentdao_common::utils::amount::lamports_to_sol;
use agentdao_common::{Address, Clock, SystemClock, Wallet};

use super::errors::{PaymentError, VerifyFailure};
use super::request::{
    PaymentId, PaymentRequest, PaymentStats, PaymentStatus, PaymentSummary, VerifiedPayment,
};

pub const DEFAULT_NETWORK: &str = "solana-devnet";
pub const DEFAULT_TTL_SECS: u64 = 60;
/// Longest expiry window a node accepts in its configuration.
pub const MAX_TTL_SECS: u64 = 86_400;

#[derive(Debug, Default)]
struct Book {
    requests: HashMap<PaymentId, PaymentRequest>,
    // Insertion order for `list`.
    order: Vec<PaymentId>,
    // Requests claimed by a `pay` call whose transfer is still running.
    in_flight: HashSet<PaymentId>,
}

/// Registry of x402 payment requirements.
///
/// `pay` is the only mutating transition and happens once per request;
/// `verify` is read-only and may be called any number of times.
pub struct PaymentLedger {
    network: String,
    ttl: Duration,
    rail: Arc<dyn TransferRail>,
    clock: Arc<dyn Clock>,
    book: RwLock<Book>,
}

impl PaymentLedger {
    pub fn new(rail: Arc<dyn TransferRail>) -> Self {
        Self::with_clock(rail, Arc::new(SystemClock))
    }

    pub fn with_clock(rail: Arc<dyn TransferRail>, clock: Arc<dyn Clock>) -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            rail,
            clock,
            book: RwLock::new(Book::default()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Mints a `pending` requirement that expires `ttl` from now.
    pub async fn create_requirement(
        &self,
        amount: u64,
        description: impl Into<String>,
        resource: impl Into<String>,
    ) -> Result<PaymentRequest, PaymentError> {
        if amount == 0 {
            return Err(PaymentError::InvalidAmount);
        }

        let now = self.clock.now();
        let invalid_ttl = || PaymentError::InvalidTtl(self.ttl.as_secs());
        let ttl = ChronoDuration::from_std(self.ttl).map_err(|_| invalid_ttl())?;
        let expires_at = now.checked_add_signed(ttl).ok_or_else(invalid_ttl)?;
        let request = PaymentRequest {
            id: PaymentId::new(),
            protocol: "x402".to_string(),
            version: "1.0".to_string(),
            network: self.network.clone(),
            amount,
            description: description.into(),
            resource: resource.into(),
            created_at: now,
            expires_at,
            status: PaymentStatus::Pending,
            signature: None,
            completed_at: None,
            error: None,
        };

        info!(
            "💳 x402 payment request {} created: {} SOL for {} ({})",
            request.id.short(),
            lamports_to_sol(amount),
            request.resource,
            request.description
        );

        let mut book = self.book.write().await;
        book.order.push(request.id);
        book.requests.insert(request.id, request.clone());
        Ok(request)
    }

    /// Settles a pending request by driving the rail from `payer` to `recipient`.
    ///
    /// The transfer is bounded by what is left of the expiry window. Any
    /// failure marks the request `failed`; nothing is retried.
    pub async fn pay(
        &self,
        id: &PaymentId,
        payer: &Wallet,
        recipient: &Address,
    ) -> Result<TransferReceipt, PaymentError> {
        let (amount, window) = self.claim(id).await?;

        debug!(
            "💸 Processing x402 payment {}: {} -> {} ({} SOL)",
            id.short(),
            payer.address().short(),
            recipient.short(),
            lamports_to_sol(amount)
        );

        let outcome = match timeout(window, self.rail.transfer(payer, recipient, amount)).await {
            Err(_) => Err(PaymentError::Timeout(window.as_secs())),
            Ok(Err(e)) => Err(PaymentError::Transfer(e.to_string())),
            Ok(Ok(receipt)) if !receipt.confirmed => Err(PaymentError::Unconfirmed(receipt.signature)),
            Ok(Ok(receipt)) => Ok(receipt),
        };

        self.settle(id, &outcome).await;
        outcome
    }

    /// Re-checks a completed request against the rail.
    pub async fn verify(&self, id: &PaymentId) -> Result<VerifiedPayment, VerifyFailure> {
        let (amount, signature) = {
            let book = self.book.read().await;
            let request = book.requests.get(id).ok_or(VerifyFailure::NotFound(*id))?;
            match (&request.status, &request.signature) {
                (PaymentStatus::Completed, Some(signature)) => (request.amount, signature.clone()),
                _ => return Err(VerifyFailure::NotCompleted(*id)),
            }
        };

        match self.rail.confirm(&signature).await {
            Ok(true) => {
                debug!("✅ Payment {} verified on the rail", id.short());
                Ok(VerifiedPayment { id: *id, amount, signature })
            }
            Ok(false) => {
                warn!("⚠️ Payment {} completed but receipt {} is unknown to the rail", id.short(), signature);
                Err(VerifyFailure::Unconfirmed(signature))
            }
            Err(e) => {
                warn!("⚠️ Verification of payment {} failed: {}", id.short(), e);
                Err(VerifyFailure::Rail(e.to_string()))
            }
        }
    }

    /// Marks every pending, unclaimed request past its expiry as `failed`.
    /// Returns how many were swept.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut book = self.book.write().await;
        let Book { requests, in_flight, .. } = &mut *book;

        let mut swept = 0;
        for request in requests.values_mut() {
            if request.status == PaymentStatus::Pending
                && !in_flight.contains(&request.id)
                && request.is_expired_at(now)
            {
                request.status = PaymentStatus::Failed;
                request.error = Some("Payment request expired".to_string());
                swept += 1;
            }
        }
        if swept > 0 {
            info!("🧹 Swept {} expired payment requests", swept);
        }
        swept
    }

    pub async fn get(&self, id: &PaymentId) -> Option<PaymentRequest> {
        self.book.read().await.requests.get(id).cloned()
    }

    /// Full requests in insertion order.
    pub async fn requests(&self) -> Vec<PaymentRequest> {
        let book = self.book.read().await;
        book.order
            .iter()
            .filter_map(|id| book.requests.get(id).cloned())
            .collect()
    }

    /// Interop summaries in insertion order.
    pub async fn list(&self) -> Vec<PaymentSummary> {
        let book = self.book.read().await;
        book.order
            .iter()
            .filter_map(|id| book.requests.get(id).map(PaymentRequest::summary))
            .collect()
    }

    pub async fn stats(&self) -> PaymentStats {
        let book = self.book.read().await;
        book.requests.values().fold(PaymentStats::default(), |mut stats, r| {
            stats.total += 1;
            match r.status {
                PaymentStatus::Pending => stats.pending += 1,
                PaymentStatus::Failed => stats.failed += 1,
                PaymentStatus::Completed => {
                    stats.completed += 1;
                    stats.total_volume += r.amount;
                }
            }
            stats
        })
    }

    /// Claims a pending request for settlement. This is the compare-and-swap
    /// half of the transition: a second caller sees `AlreadyProcessed`.
    async fn claim(&self, id: &PaymentId) -> Result<(u64, Duration), PaymentError> {
        let now = self.clock.now();
        let mut book = self.book.write().await;

        if book.in_flight.contains(id) {
            return Err(PaymentError::AlreadyProcessed(*id));
        }

        let request = book.requests.get_mut(id).ok_or(PaymentError::NotFound(*id))?;
        if request.status != PaymentStatus::Pending {
            warn!("⚠️ Payment request {} already processed ({:?})", id.short(), request.status);
            return Err(PaymentError::AlreadyProcessed(*id));
        }

        if request.is_expired_at(now) {
            request.status = PaymentStatus::Failed;
            request.error = Some("Payment request expired".to_string());
            error!("❌ Payment {} failed: request expired", id.short());
            return Err(PaymentError::Expired(*id));
        }

        let window = (request.expires_at - now).to_std().unwrap_or(Duration::ZERO);
        let amount = request.amount;
        book.in_flight.insert(*id);
        Ok((amount, window))
    }

    async fn settle(&self, id: &PaymentId, outcome: &Result<TransferReceipt, PaymentError>) {
        let now = self.clock.now();
        let mut book = self.book.write().await;
        book.in_flight.remove(id);

        let Some(request) = book.requests.get_mut(id) else {
            return;
        };

        match outcome {
            Ok(receipt) => {
                request.status = PaymentStatus::Completed;
                request.signature = Some(receipt.signature.clone());
                request.completed_at = Some(now);
                info!("✅ Payment {} completed: {}", id.short(), receipt.signature);
            }
            Err(e) => {
                request.status = PaymentStatus::Failed;
                request.error = Some(e.to_string());
                error!("❌ Payment {} failed: {}", id.short(), e);
            }
        }
    }
}

impl std::fmt::Debug for PaymentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentLedger")
            .field("network", &self.network)
            .field("ttl", &self.ttl)
            .finish()
    }
}
