use thiserror::Error;

use super::request::PaymentId;

/// Reasons a payment requirement could not be minted or paid.
///
/// Every variant raised by `pay` leaves the request in a terminal state
/// except `NotFound` and `AlreadyProcessed`, which never touch it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// Requirements must ask for a strictly positive amount.
    #[error("Invalid amount: payment requirements must be greater than zero")]
    InvalidAmount,

    /// The expiry window does not fit the clock's date range.
    #[error("Invalid payment TTL: {0}s")]
    InvalidTtl(u64),

    #[error("Payment request {0} not found")]
    NotFound(PaymentId),

    /// The request already left `pending`, or another payer is settling it.
    #[error("Payment request {0} already processed")]
    AlreadyProcessed(PaymentId),

    #[error("Payment request {0} expired")]
    Expired(PaymentId),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The rail accepted the transfer but never reported it confirmed.
    #[error("Transfer {0} was not confirmed")]
    Unconfirmed(String),

    #[error("Transfer confirmation timed out after {0}s")]
    Timeout(u64),
}

/// Why `verify` refused to vouch for a payment.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyFailure {
    #[error("Payment request {0} not found")]
    NotFound(PaymentId),

    #[error("Payment request {0} is not completed")]
    NotCompleted(PaymentId),

    /// Completed locally, but the rail does not recognise the receipt.
    #[error("Receipt {0} is not confirmed by the rail")]
    Unconfirmed(String),

    #[error("Rail lookup failed: {0}")]
    Rail(String),
}
