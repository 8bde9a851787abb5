use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agentdao_common::utils::amount::as_sol;

use crate::agent::{Agent, AgentId};
use crate::errors::GovernanceError;

/// An agent admitted to the DAO. Voting power is fixed at join time.
#[derive(Debug, Clone)]
pub struct Member {
    pub agent: Agent,
    pub stake: u64,
    pub voting_power: u64,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn summary(&self) -> MemberSummary {
        MemberSummary {
            id: self.agent.id().clone(),
            name: self.agent.name().to_string(),
            stake: self.stake,
            voting_power: self.voting_power,
            joined_at: self.joined_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: AgentId,
    pub name: String,
    #[serde(with = "as_sol")]
    pub stake: u64,
    #[serde(with = "as_sol")]
    pub voting_power: u64,
    pub joined_at: DateTime<Utc>,
}

/// Members keyed by agent id, remembering join order.
#[derive(Debug, Clone, Default)]
pub struct MembershipRegistry {
    members: HashMap<AgentId, Member>,
    order: Vec<AgentId>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits `agent` with voting power equal to `stake`.
    pub fn join(
        &mut self,
        mut agent: Agent,
        stake: u64,
        joined_at: DateTime<Utc>,
    ) -> Result<&Member, GovernanceError> {
        let id = agent.id().clone();
        if self.members.contains_key(&id) {
            return Err(GovernanceError::AlreadyMember(id));
        }

        agent.assign_voting_power(stake);
        self.order.push(id.clone());
        let member = self.members.entry(id).or_insert(Member {
            agent,
            stake,
            voting_power: stake,
            joined_at,
        });
        Ok(&*member)
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.members.contains_key(id)
    }

    pub fn get(&self, id: &AgentId) -> Option<&Member> {
        self.members.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &AgentId) -> Option<&mut Member> {
        self.members.get_mut(id)
    }

    pub fn total_voting_power(&self) -> u64 {
        self.members.values().map(|m| m.voting_power).sum()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in join order.
    pub fn list(&self) -> Vec<&Member> {
        self.order.iter().filter_map(|id| self.members.get(id)).collect()
    }
}
