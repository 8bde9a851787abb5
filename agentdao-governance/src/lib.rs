//! Payment-gated governance for an agent DAO.
//!
//! Joining, proposing, voting and payouts are each authorized by an x402
//! payment settled through the [`agentdao_ledger::PaymentLedger`] before the
//! [`GovernanceEngine`] touches any state.

pub mod agent;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod events;
pub mod membership;
pub mod proposals;
pub mod treasury;
pub mod views;

pub use agent::{Agent, AgentId, AgentSummary};
pub use engine::{ExecutionOutcome, GovernanceConfig, GovernanceEngine, ShortfallPolicy};
pub use errors::GovernanceError;
pub use evaluator::{QuorumBase, QuorumEvaluator, QuorumPolicy, Verdict};
pub use events::{DaoEvent, TallyView};
pub use membership::{Member, MemberSummary, MembershipRegistry};
pub use proposals::{Proposal, ProposalId, ProposalStatus, ProposalStore, ProposalSummary, VoteChoice, VoteRecord};
pub use treasury::Treasury;
pub use views::{DaoSnapshot, DaoStats};
