use std::sync::Arc;

use async_trait::async_trait;

use agentdao_common::ports::{DecisionError, DecisionMaker};
use agentdao_governance::{DaoEvent, ExecutionOutcome, ProposalStatus};
use agentdao_ledger::PaymentStatus;
use agentdao_node::config::Config;
use agentdao_node::decision::Deliberator;
use agentdao_node::runtime::builder::build_runtime_with;
use agentdao_node::runtime::simulation::{run_simulation, PERSONAS};

/// Gives the same answer to every prompt.
struct Unanimous(&'static str);

#[async_trait]
impl DecisionMaker for Unanimous {
    async fn decide(&self, _prompt: &str, _options: &[String]) -> Result<String, DecisionError> {
        Ok(self.0.to_string())
    }
}

fn quick_config() -> Config {
    Config { pacing_ms: 0, ..Config::default() }
}

fn unanimous(answer: &'static str) -> Deliberator {
    Deliberator::new(Arc::new(Unanimous(answer)))
}

#[tokio::test]
async fn test_unanimous_support_with_small_treasury() {
    let rt = build_runtime_with(&quick_config(), unanimous("1")).await.unwrap();
    let report = run_simulation(&rt).await.unwrap();

    // 5 x 0.1 stakes + 2 x 0.01 proposal fees + 10 x 0.001 vote fees.
    assert_eq!(report.stats.treasury_balance, 530_000_000);
    assert_eq!(report.stats.total_agents, 5);
    assert_eq!(report.stats.total_proposals, 2);
    assert_eq!(report.stats.passed_proposals, 2);

    // Both requests exceed the treasury, so neither is paid out.
    assert_eq!(
        report.outcomes,
        vec![
            (1, ExecutionOutcome::PassedWithoutPayout { requested: 800_000_000, available: 530_000_000 }),
            (2, ExecutionOutcome::PassedWithoutPayout { requested: 600_000_000, available: 530_000_000 }),
        ]
    );

    assert_eq!(report.evaluations.len(), 2);
    assert_eq!(report.evaluations[0].agent, PERSONAS[0].name);
    assert_eq!(report.evaluations[1].agent, PERSONAS[3].name);

    let payments = rt.ledger.stats().await;
    assert_eq!(payments.total, 19);
    assert_eq!(payments.completed, 19);
}

#[tokio::test]
async fn test_unanimous_opposition_rejects_everything() {
    let rt = build_runtime_with(&quick_config(), unanimous("2")).await.unwrap();
    let report = run_simulation(&rt).await.unwrap();

    assert_eq!(report.stats.rejected_proposals, 2);
    assert_eq!(report.stats.passed_proposals, 0);
    assert!(report.evaluations.is_empty());
    assert!(report.outcomes.iter().all(|(_, o)| *o == ExecutionOutcome::Rejected));

    let proposals = rt.engine.proposals().await;
    assert!(proposals.iter().all(|p| p.status == ProposalStatus::Rejected && p.votes_against == 500_000_000));
    assert_eq!(rt.ledger.stats().await.total, 17);
}

#[tokio::test]
async fn test_funded_treasury_pays_out() {
    let config = Config { join_stake_sol: 0.5, agent_seed_sol: 2.0, ..quick_config() };
    let rt = build_runtime_with(&config, unanimous("1")).await.unwrap();
    let report = run_simulation(&rt).await.unwrap();

    assert_eq!(
        report.outcomes,
        vec![
            (1, ExecutionOutcome::Passed { payout: 800_000_000 }),
            (2, ExecutionOutcome::Passed { payout: 600_000_000 }),
        ]
    );
    // 2.53 collected, 1.4 paid out.
    assert_eq!(report.stats.treasury_balance, 1_130_000_000);

    let agents = rt.engine.agents().await;
    assert_eq!(agents[0].reputation, 5);
    assert_eq!(agents[3].reputation, 5);

    let payouts: Vec<_> = rt
        .ledger
        .requests()
        .await
        .into_iter()
        .filter(|r| r.resource.ends_with("/payout"))
        .collect();
    assert_eq!(payouts.len(), 2);
    assert!(payouts.iter().all(|r| r.status == PaymentStatus::Completed));
}

#[tokio::test]
async fn test_event_stream_bookends() {
    let rt = build_runtime_with(&quick_config(), unanimous("1")).await.unwrap();
    let mut rx = rt.engine.subscribe();
    run_simulation(&rt).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.kind());
        if let DaoEvent::SimulationComplete { agents, proposals, .. } = &event {
            assert_eq!(agents.len(), 5);
            assert_eq!(proposals.len(), 2);
        }
    }

    assert_eq!(kinds.first(), Some(&"SIMULATION_START"));
    assert_eq!(kinds.last(), Some(&"SIMULATION_COMPLETE"));
    assert_eq!(kinds.iter().filter(|k| **k == "AGENT_CREATED").count(), 5);
    assert_eq!(kinds.iter().filter(|k| **k == "AGENT_THINKING").count(), 10);
    assert_eq!(kinds.iter().filter(|k| **k == "VOTE_CAST").count(), 10);
    assert_eq!(kinds.iter().filter(|k| **k == "PROPOSAL_EXECUTED").count(), 2);

    // Every member thinks before the first vote on a proposal lands.
    let first_thinking = kinds.iter().position(|k| *k == "AGENT_THINKING").unwrap();
    let first_vote = kinds.iter().position(|k| *k == "VOTE_CAST").unwrap();
    assert!(first_thinking + 5 <= first_vote);
}

#[tokio::test]
async fn test_random_decisions_still_complete() {
    let rt = build_runtime_with(&quick_config(), Deliberator::offline()).await.unwrap();
    let report = run_simulation(&rt).await.unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.stats.active_proposals, 0);
    let proposals = rt.engine.proposals().await;
    assert!(proposals.iter().all(|p| p.total_votes() == 500_000_000));
}
