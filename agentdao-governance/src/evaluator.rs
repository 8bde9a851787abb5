use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::proposals::Proposal;

/// Which total voting power the quorum is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumBase {
    /// Everyone who is a member when the proposal is executed.
    #[default]
    CurrentMembers,
    /// Members at the moment the proposal was created.
    CreationSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuorumPolicy {
    pub fraction: f64,
    #[serde(default)]
    pub base: QuorumBase,
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        Self { fraction: 0.5, base: QuorumBase::CurrentMembers }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    QuorumNotMet,
    Passed,
    Rejected,
}

/// Outcome of counting a proposal's votes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tally {
    pub verdict: Verdict,
    pub total_votes: u64,
    pub total_power: u64,
    pub threshold: f64,
}

/// Quorum and majority arithmetic over accumulated voting power.
#[derive(Debug, Clone, Default)]
pub struct QuorumEvaluator {
    pub policy: QuorumPolicy,
}

impl QuorumEvaluator {
    pub fn new(policy: QuorumPolicy) -> Self {
        Self { policy }
    }

    /// Quorum holds when participating power reaches `fraction` of the
    /// total; passing then needs strictly more power for than against.
    pub fn evaluate(&self, votes_for: u64, votes_against: u64, total_power: u64) -> Tally {
        let total_votes = votes_for + votes_against;
        let threshold = total_power as f64 * self.policy.fraction;

        let verdict = if (total_votes as f64) < threshold {
            Verdict::QuorumNotMet
        } else if votes_for > votes_against {
            Verdict::Passed
        } else {
            Verdict::Rejected
        };

        debug!(
            "🗳️ Tally: for={} against={} total_power={} threshold={:.0} -> {:?}",
            votes_for, votes_against, total_power, threshold, verdict
        );

        Tally { verdict, total_votes, total_power, threshold }
    }

    /// Evaluates `proposal`, picking the power base from the policy.
    pub fn evaluate_proposal(&self, proposal: &Proposal, current_power: u64) -> Tally {
        let total_power = match self.policy.base {
            QuorumBase::CurrentMembers => current_power,
            QuorumBase::CreationSnapshot => proposal.power_snapshot,
        };
        self.evaluate(proposal.votes_for, proposal.votes_against, total_power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposals::ProposalStore;
    use chrono::Utc;

    const TENTH: u64 = 100_000_000;

    #[test]
    fn test_quorum_met_and_passed() {
        let evaluator = QuorumEvaluator::default();
        // Five members at 0.1 each; 0.3 participating against a 0.25 threshold.
        let tally = evaluator.evaluate(2 * TENTH, TENTH, 5 * TENTH);
        assert_eq!(tally.verdict, Verdict::Passed);
        assert_eq!(tally.total_votes, 3 * TENTH);
    }

    #[test]
    fn test_quorum_not_met() {
        let evaluator = QuorumEvaluator::default();
        let tally = evaluator.evaluate(2 * TENTH, 0, 5 * TENTH);
        assert_eq!(tally.verdict, Verdict::QuorumNotMet);
    }

    #[test]
    fn test_quorum_exactly_at_threshold() {
        let evaluator = QuorumEvaluator::default();
        let tally = evaluator.evaluate(3 * TENTH, TENTH, 8 * TENTH);
        assert_eq!(tally.verdict, Verdict::Passed);
    }

    #[test]
    fn test_tie_is_rejected() {
        let evaluator = QuorumEvaluator::default();
        let tally = evaluator.evaluate(2 * TENTH, 2 * TENTH, 5 * TENTH);
        assert_eq!(tally.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_snapshot_base_ignores_later_members() {
        let mut store = ProposalStore::new();
        let id = store.create("agent_a".into(), "Alice", "t", "d", 0, 2 * TENTH, Utc::now()).id;
        store
            .record_vote(id, &"agent_a".into(), crate::proposals::VoteChoice::For, TENTH, Utc::now())
            .unwrap();
        let proposal = store.get(id).unwrap();

        // Membership grew to 1.0 after creation.
        let current = QuorumEvaluator::default().evaluate_proposal(proposal, 10 * TENTH);
        assert_eq!(current.verdict, Verdict::QuorumNotMet);

        let snapshot = QuorumEvaluator::new(QuorumPolicy { fraction: 0.5, base: QuorumBase::CreationSnapshot })
            .evaluate_proposal(proposal, 10 * TENTH);
        assert_eq!(snapshot.verdict, Verdict::Passed);
        assert_eq!(snapshot.total_power, 2 * TENTH);
    }
}
