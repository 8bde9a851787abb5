use serde::{Deserialize, Serialize};

use crate::evaluator::QuorumPolicy;

/// What happens when a passed proposal asks for more than the treasury holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Proposal is marked `passed`; nothing is paid and the creator earns no bonus.
    #[default]
    MarkPassed,
    /// Proposal is marked `failed`.
    MarkFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub quorum: QuorumPolicy,
    #[serde(default)]
    pub shortfall: ShortfallPolicy,
    pub reputation_bonus: u32,
    pub reputation_penalty: u32,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            quorum: QuorumPolicy::default(),
            shortfall: ShortfallPolicy::default(),
            reputation_bonus: 5,
            reputation_penalty: 1,
        }
    }
}
