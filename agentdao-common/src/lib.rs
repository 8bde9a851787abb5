//! Shared building blocks for the AgentDAO workspace.
//!
//! Everything here is free of governance rules: identifiers, wallets,
//! clocks, amount conversions, the event bus and the ports through which
//! the core talks to its external collaborators.

pub mod auth;
pub mod error;
pub mod events;
pub mod ports;
pub mod utils;

pub use auth::{Address, Wallet};
pub use error::{DaoError, Result};
pub use events::EventBus;
pub use utils::time::{Clock, ManualClock, SystemClock};
