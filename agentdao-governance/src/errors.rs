use thiserror::Error;

use agentdao_ledger::{PaymentError, VerifyFailure};

use crate::agent::AgentId;
use crate::proposals::ProposalId;

/// Why a governance action was refused.
///
/// Precondition variants are raised before any payment is requested;
/// `Payment` and `Verification` mean the action was attempted and nothing
/// in the DAO changed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Agent {0} is not a DAO member")]
    NotMember(AgentId),

    #[error("Agent {0} is already a DAO member")]
    AlreadyMember(AgentId),

    #[error("Proposal #{0} does not exist")]
    ProposalNotFound(ProposalId),

    #[error("Proposal #{0} is not active")]
    NotActive(ProposalId),

    #[error("Agent {agent} has already voted on proposal #{proposal}")]
    DuplicateVote { proposal: ProposalId, agent: AgentId },

    #[error("Payment failed: {0}")]
    Payment(#[from] PaymentError),

    #[error("Payment verification failed: {0}")]
    Verification(#[from] VerifyFailure),

    #[error("Insufficient treasury funds: {available} lamports available, {requested} requested")]
    InsufficientFunds { available: u64, requested: u64 },
}

impl GovernanceError {
    /// True for refusals that never reached the payment layer.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            GovernanceError::NotMember(_)
                | GovernanceError::AlreadyMember(_)
                | GovernanceError::ProposalNotFound(_)
                | GovernanceError::NotActive(_)
                | GovernanceError::DuplicateVote { .. }
        )
    }
}
