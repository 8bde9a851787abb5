use serde::Serialize;

use agentdao_common::utils::amount::as_sol;
use agentdao_ledger::PaymentSummary;

use crate::agent::AgentSummary;
use crate::proposals::{ProposalId, ProposalStatus, ProposalSummary, VoteChoice};
use crate::views::DaoStats;

/// Running tally carried by `VOTE_CAST`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyView {
    pub id: ProposalId,
    #[serde(with = "as_sol")]
    pub votes_for: u64,
    #[serde(with = "as_sol")]
    pub votes_against: u64,
}

/// One state transition, serialized as `{"type": ..., "payload": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DaoEvent {
    SimulationStart {
        message: String,
    },
    Status {
        message: String,
    },
    AgentCreated(AgentSummary),
    MemberJoined {
        agent: AgentSummary,
        #[serde(with = "as_sol")]
        treasury: u64,
    },
    Payment(PaymentSummary),
    ProposalCreated(ProposalSummary),
    #[serde(rename_all = "camelCase")]
    AgentThinking {
        agent_name: String,
    },
    VoteCast {
        agent: String,
        vote: VoteChoice,
        proposal: TallyView,
    },
    #[serde(rename_all = "camelCase")]
    ProposalExecuted {
        proposal_id: ProposalId,
        status: ProposalStatus,
        passed: bool,
    },
    SimulationComplete {
        stats: DaoStats,
        agents: Vec<AgentSummary>,
        proposals: Vec<ProposalSummary>,
    },
    Error {
        message: String,
    },
}

impl DaoEvent {
    pub fn status(message: impl Into<String>) -> Self {
        DaoEvent::Status { message: message.into() }
    }

    /// The `type` tag, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DaoEvent::SimulationStart { .. } => "SIMULATION_START",
            DaoEvent::Status { .. } => "STATUS",
            DaoEvent::AgentCreated(_) => "AGENT_CREATED",
            DaoEvent::MemberJoined { .. } => "MEMBER_JOINED",
            DaoEvent::Payment(_) => "PAYMENT",
            DaoEvent::ProposalCreated(_) => "PROPOSAL_CREATED",
            DaoEvent::AgentThinking { .. } => "AGENT_THINKING",
            DaoEvent::VoteCast { .. } => "VOTE_CAST",
            DaoEvent::ProposalExecuted { .. } => "PROPOSAL_EXECUTED",
            DaoEvent::SimulationComplete { .. } => "SIMULATION_COMPLETE",
            DaoEvent::Error { .. } => "ERROR",
        }
    }
}
