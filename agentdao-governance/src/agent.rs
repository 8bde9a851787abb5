use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use agentdao_common::utils::amount::as_sol;
use agentdao_common::utils::time::current_millis;
use agentdao_common::{Address, Wallet};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Identifier of an agent, `agent_<millis>_<9 base36 chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        AgentId(format!("agent_{}_{}", current_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

/// An autonomous participant holding a wallet.
///
/// Identity fields are public; governance counters can only be changed by
/// the engine once the agent is a member.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    name: String,
    personality: String,
    wallet: Arc<Wallet>,
    voting_power: u64,
    reputation: u32,
    proposals_created: u32,
    votes_cast: u32,
}

impl Agent {
    /// Creates an agent with a freshly generated wallet.
    pub fn new(name: impl Into<String>, personality: impl Into<String>) -> Self {
        Self::with_wallet(name, personality, Wallet::generate())
    }

    pub fn with_wallet(name: impl Into<String>, personality: impl Into<String>, wallet: Wallet) -> Self {
        Self {
            id: AgentId::generate(),
            name: name.into(),
            personality: personality.into(),
            wallet: Arc::new(wallet),
            voting_power: 0,
            reputation: 0,
            proposals_created: 0,
            votes_cast: 0,
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn personality(&self) -> &str {
        &self.personality
    }

    pub fn wallet(&self) -> &Arc<Wallet> {
        &self.wallet
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn voting_power(&self) -> u64 {
        self.voting_power
    }

    pub fn reputation(&self) -> u32 {
        self.reputation
    }

    pub fn proposals_created(&self) -> u32 {
        self.proposals_created
    }

    pub fn votes_cast(&self) -> u32 {
        self.votes_cast
    }

    pub(crate) fn assign_voting_power(&mut self, power: u64) {
        self.voting_power = power;
    }

    pub(crate) fn reward(&mut self, amount: u32) {
        self.reputation = self.reputation.saturating_add(amount);
    }

    /// Reputation never drops below zero.
    pub(crate) fn penalize(&mut self, amount: u32) {
        self.reputation = self.reputation.saturating_sub(amount);
    }

    pub(crate) fn record_proposal(&mut self) {
        self.proposals_created += 1;
    }

    pub(crate) fn record_vote(&mut self) {
        self.votes_cast += 1;
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            personality: self.personality.clone(),
            wallet: self.address(),
            voting_power: self.voting_power,
            reputation: self.reputation,
            proposals_created: self.proposals_created,
            votes_cast: self.votes_cast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub id: AgentId,
    pub name: String,
    pub personality: String,
    pub wallet: Address,
    #[serde(with = "as_sol")]
    pub voting_power: u64,
    pub reputation: u32,
    pub proposals_created: u32,
    pub votes_cast: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_format() {
        let id = AgentId::generate();
        let parts: Vec<&str> = id.as_str().splitn(3, '_').collect();
        assert_eq!(parts[0], "agent");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_agent_ids_are_unique() {
        let a = Agent::new("Alice", "bold");
        let b = Agent::new("Alice", "bold");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_penalize_saturates_at_zero() {
        let mut agent = Agent::new("Eve", "skeptic");
        agent.penalize(1);
        assert_eq!(agent.reputation(), 0);

        agent.reward(5);
        agent.penalize(2);
        assert_eq!(agent.reputation(), 3);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let mut agent = Agent::new("Bob", "cautious");
        agent.assign_voting_power(100_000_000);
        agent.record_vote();

        let json = serde_json::to_value(agent.summary()).unwrap();
        assert_eq!(json["votingPower"], serde_json::json!(0.1));
        assert_eq!(json["votesCast"], 1);
        assert_eq!(json["proposalsCreated"], 0);
        assert_eq!(json["wallet"], agent.address().as_str());
    }
}
