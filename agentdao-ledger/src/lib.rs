//! x402 payment requests and the rail that settles them.
//!
//! `PaymentLedger` owns the lifecycle of every payment requirement the DAO
//! mints: `pending` until paid, then exactly one transition to `completed`
//! or `failed`. `SimulatedRail` is an in-process stand-in for the value
//! transfer network.

pub mod payment;
pub mod rail;

pub use payment::{
    PaymentError, PaymentId, PaymentLedger, PaymentRequest, PaymentStats, PaymentStatus,
    PaymentSummary, VerifiedPayment, VerifyFailure, DEFAULT_NETWORK, DEFAULT_TTL_SECS,
    MAX_TTL_SECS,
};
pub use rail::SimulatedRail;
