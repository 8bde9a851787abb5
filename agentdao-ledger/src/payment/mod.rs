mod errors;
mod ledger;
mod request;

pub use errors::{PaymentError, VerifyFailure};
pub use ledger::{PaymentLedger, DEFAULT_NETWORK, DEFAULT_TTL_SECS, MAX_TTL_SECS};
pub use request::{
    PaymentId, PaymentRequest, PaymentStats, PaymentStatus, PaymentSummary, VerifiedPayment,
};
