use serde::{Deserialize, Serialize};

use agentdao_common::utils::amount::as_sol;
use agentdao_ledger::{PaymentStats, PaymentSummary};

use crate::agent::AgentSummary;
use crate::proposals::ProposalSummary;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoStats {
    pub total_agents: usize,
    pub total_proposals: usize,
    pub active_proposals: usize,
    pub passed_proposals: usize,
    pub rejected_proposals: usize,
    #[serde(with = "as_sol")]
    pub treasury_balance: u64,
    pub x402_payments: PaymentStats,
}

/// Everything an observer needs to render the DAO.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaoSnapshot {
    pub agents: Vec<AgentSummary>,
    pub proposals: Vec<ProposalSummary>,
    pub stats: DaoStats,
    pub payments: Vec<PaymentSummary>,
}
