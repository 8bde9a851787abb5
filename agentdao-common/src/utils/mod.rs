//! utils
//!
//! Clock abstraction and lamport/SOL conversions shared across AgentDAO.

pub mod amount;
pub mod time;

pub use amount::{lamports_to_sol, sol_to_lamports, LAMPORTS_PER_SOL};
