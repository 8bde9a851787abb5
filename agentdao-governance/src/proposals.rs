use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agentdao_common::utils::amount::as_sol;
use agentdao_ledger::PaymentId;

use crate::agent::AgentId;
use crate::errors::GovernanceError;

pub type ProposalId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    For,
    Against,
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteChoice::For => f.write_str("for"),
            VoteChoice::Against => f.write_str("against"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
    Failed,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRecord {
    pub choice: VoteChoice,
    pub power: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub creator: AgentId,
    pub creator_name: String,
    pub requested_amount: u64,
    pub status: ProposalStatus,
    pub votes_for: u64,
    pub votes_against: u64,
    pub votes: HashMap<AgentId, VoteRecord>,
    voter_order: Vec<AgentId>,
    /// Total member voting power when the proposal was created.
    pub power_snapshot: u64,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    /// Payout request whose transfer has settled but whose effects are not applied yet.
    pub payout_payment: Option<PaymentId>,
}

impl Proposal {
    pub fn total_votes(&self) -> u64 {
        self.votes_for + self.votes_against
    }

    pub fn has_voted(&self, agent: &AgentId) -> bool {
        self.votes.contains_key(agent)
    }

    /// Voter ids in the order the votes were cast.
    pub fn voters(&self) -> &[AgentId] {
        &self.voter_order
    }

    pub fn summary(&self) -> ProposalSummary {
        ProposalSummary {
            id: self.id,
            number: self.id,
            creator_name: self.creator_name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            requested_amount: self.requested_amount,
            votes_for: self.votes_for,
            votes_against: self.votes_against,
            voters: self.voter_order.clone(),
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub id: ProposalId,
    pub number: ProposalId,
    pub creator_name: String,
    pub title: String,
    pub description: String,
    #[serde(with = "as_sol")]
    pub requested_amount: u64,
    #[serde(with = "as_sol")]
    pub votes_for: u64,
    #[serde(with = "as_sol")]
    pub votes_against: u64,
    pub voters: Vec<AgentId>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

/// Proposals keyed by their sequence number.
#[derive(Debug, Clone)]
pub struct ProposalStore {
    proposals: BTreeMap<ProposalId, Proposal>,
    last_id: ProposalId,
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalStore {
    pub fn new() -> Self {
        Self { proposals: BTreeMap::new(), last_id: 0 }
    }

    /// Opens a new `active` proposal under the next sequence number (first is 1).
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        creator: AgentId,
        creator_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        requested_amount: u64,
        power_snapshot: u64,
        created_at: DateTime<Utc>,
    ) -> &Proposal {
        self.last_id += 1;
        let id = self.last_id;
        self.proposals.entry(id).or_insert(Proposal {
            id,
            title: title.into(),
            description: description.into(),
            creator,
            creator_name: creator_name.into(),
            requested_amount,
            status: ProposalStatus::Active,
            votes_for: 0,
            votes_against: 0,
            votes: HashMap::new(),
            voter_order: Vec::new(),
            power_snapshot,
            created_at,
            executed_at: None,
            payout_payment: None,
        })
    }

    /// Checks that `agent` may still vote on proposal `id`.
    pub fn ensure_can_vote(&self, id: ProposalId, agent: &AgentId) -> Result<(), GovernanceError> {
        let proposal = self.proposals.get(&id).ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.status.is_terminal() {
            return Err(GovernanceError::NotActive(id));
        }
        if proposal.has_voted(agent) {
            return Err(GovernanceError::DuplicateVote { proposal: id, agent: agent.clone() });
        }
        Ok(())
    }

    /// Adds `power` to the chosen side. At most one vote per agent.
    pub fn record_vote(
        &mut self,
        id: ProposalId,
        agent: &AgentId,
        choice: VoteChoice,
        power: u64,
        timestamp: DateTime<Utc>,
    ) -> Result<&Proposal, GovernanceError> {
        self.ensure_can_vote(id, agent)?;
        let proposal = self.proposals.get_mut(&id).ok_or(GovernanceError::ProposalNotFound(id))?;

        match choice {
            VoteChoice::For => proposal.votes_for += power,
            VoteChoice::Against => proposal.votes_against += power,
        }
        proposal.votes.insert(agent.clone(), VoteRecord { choice, power, timestamp });
        proposal.voter_order.push(agent.clone());
        Ok(&*proposal)
    }

    /// Moves an active proposal to a terminal status. One-way.
    pub fn finalize(
        &mut self,
        id: ProposalId,
        status: ProposalStatus,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<&Proposal, GovernanceError> {
        let proposal = self.proposals.get_mut(&id).ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.status.is_terminal() || !status.is_terminal() {
            return Err(GovernanceError::NotActive(id));
        }
        proposal.status = status;
        proposal.executed_at = executed_at;
        Ok(&*proposal)
    }

    /// Remembers the settled payout of an active proposal so a retried
    /// execution re-verifies it instead of paying again.
    pub fn record_payout(&mut self, id: ProposalId, payment: PaymentId) -> Result<(), GovernanceError> {
        let proposal = self.proposals.get_mut(&id).ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.status.is_terminal() {
            return Err(GovernanceError::NotActive(id));
        }
        proposal.payout_payment = Some(payment);
        Ok(())
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn has_voted(&self, id: ProposalId, agent: &AgentId) -> bool {
        self.proposals.get(&id).map(|p| p.has_voted(agent)).unwrap_or(false)
    }

    /// All proposals by ascending id.
    pub fn list(&self) -> Vec<&Proposal> {
        self.proposals.values().collect()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn count_by_status(&self, status: ProposalStatus) -> usize {
        self.proposals.values().filter(|p| p.status == status).count()
    }
}
