//! Scripted end-to-end scenario: five agents join, two proposals are opened,
//! every member deliberates and votes, proposals are executed and passed
//! ones get a paid feasibility check.

use futures::future::join_all;
use tracing::{info, warn};

use agentdao_common::utils::amount::{lamports_to_sol, sol_to_lamports};
use agentdao_common::{DaoError, Result};
use agentdao_governance::{Agent, DaoEvent, DaoStats, ExecutionOutcome, Proposal, ProposalId, VoteChoice};

use crate::runtime::builder::DaoRuntime;
use crate::services::ServiceResult;

pub struct Persona {
    pub name: &'static str,
    pub personality: &'static str,
}

pub const PERSONAS: [Persona; 5] = [
    Persona {
        name: "Alice_Progressive",
        personality: "Progressive and innovative. Favors new technologies and experimental proposals. \
                      Willing to take risks for potential high rewards.",
    },
    Persona {
        name: "Bob_Conservative",
        personality: "Conservative and cautious. Prefers proven approaches and stable returns. \
                      Skeptical of risky ventures.",
    },
    Persona {
        name: "Charlie_Pragmatic",
        personality: "Pragmatic and data-driven. Makes decisions based on concrete evidence and expected ROI. \
                      Balanced approach.",
    },
    Persona {
        name: "Diana_Visionary",
        personality: "Visionary idealist. Supports proposals that benefit the community and long-term growth, \
                      even at short-term cost.",
    },
    Persona {
        name: "Eve_Skeptic",
        personality: "Healthy skeptic. Questions everything and requires strong justification. \
                      Often votes against unless convinced.",
    },
];

struct ProposalPlan {
    author: usize,
    title: &'static str,
    description: &'static str,
    requested_sol: f64,
}

const PROPOSALS: [ProposalPlan; 2] = [
    ProposalPlan {
        author: 0,
        title: "Build AI Research Lab",
        description: "Allocate funds to establish an AI research laboratory for advancing autonomous agent capabilities.",
        requested_sol: 0.8,
    },
    ProposalPlan {
        author: 3,
        title: "Community Education Program",
        description: "Fund educational initiatives to teach humans about AI agent economies.",
        requested_sol: 0.6,
    },
];

const EVALUATION_SERVICE: &str = "proposal-evaluation";

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub stats: DaoStats,
    pub outcomes: Vec<(ProposalId, ExecutionOutcome)>,
    pub evaluations: Vec<ServiceResult>,
}

pub fn vote_context(proposal: &Proposal, treasury: u64) -> String {
    format!(
        "The DAO is voting on: \"{}\". Description: {}. Treasury has {} SOL. This proposal requests {} SOL.",
        proposal.title,
        proposal.description,
        lamports_to_sol(treasury),
        lamports_to_sol(proposal.requested_amount)
    )
}

/// Runs the full scenario against `rt`.
///
/// Individual governance failures are logged and the run carries on; it
/// only errors when not a single proposal could be opened.
pub async fn run_simulation(rt: &DaoRuntime) -> Result<SimulationReport> {
    let engine = &rt.engine;
    let pace = || tokio::time::sleep(rt.config.pacing());

    info!("🚀 Starting AI Agent DAO Simulation with x402 payments");
    engine.publish(DaoEvent::SimulationStart {
        message: "Starting AI Agent DAO simulation with x402 payments".to_string(),
    });

    engine.publish(DaoEvent::status("Creating AI agents..."));
    let mut agents = Vec::with_capacity(PERSONAS.len());
    for persona in PERSONAS.iter() {
        let agent = rt.spawn_agent(persona.name, persona.personality).await;
        engine.publish(DaoEvent::AgentCreated(agent.summary()));
        agents.push(agent);
    }
    pace().await;

    engine.publish(DaoEvent::status("Agents joining DAO..."));
    let stake = rt.config.join_stake();
    for agent in &agents {
        if let Err(e) = engine.join_dao(agent.clone(), stake).await {
            warn!("⚠️ {} could not join: {}", agent.name(), e);
        }
        pace().await;
    }

    engine.publish(DaoEvent::status("Creating proposals..."));
    let mut proposal_ids = Vec::with_capacity(PROPOSALS.len());
    for plan in PROPOSALS.iter() {
        let Some(author) = agents.get(plan.author) else { continue };
        match engine
            .create_proposal(
                author.id(),
                plan.title,
                plan.description,
                sol_to_lamports(plan.requested_sol),
                rt.config.proposal_fee(),
            )
            .await
        {
            Ok(proposal) => proposal_ids.push(proposal.id),
            Err(e) => warn!("⚠️ Proposal \"{}\" by {} not created: {}", plan.title, author.name(), e),
        }
        pace().await;
    }
    if proposal_ids.is_empty() {
        let message = "no proposal could be created".to_string();
        engine.publish(DaoEvent::Error { message: message.clone() });
        return Err(DaoError::Other(message));
    }

    let mut voters = Vec::with_capacity(agents.len());
    for agent in &agents {
        if engine.is_member(agent.id()).await {
            voters.push(agent);
        }
    }

    for &proposal_id in &proposal_ids {
        let Some(proposal) = engine.proposal(proposal_id).await else { continue };
        engine.publish(DaoEvent::status(format!("Agents deliberating on Proposal #{}...", proposal_id)));

        let context = vote_context(&proposal, engine.treasury_balance().await);
        let choices = deliberate(rt, &voters, &context).await;

        for (agent, choice) in voters.iter().zip(choices) {
            if let Err(e) = engine.vote(agent.id(), proposal_id, choice, rt.config.vote_fee()).await {
                warn!("⚠️ Vote by {} on Proposal #{} not counted: {}", agent.name(), proposal_id, e);
            }
            pace().await;
        }
    }

    engine.publish(DaoEvent::status("Executing proposals..."));
    let mut outcomes = Vec::with_capacity(proposal_ids.len());
    let mut evaluations = Vec::new();
    for &proposal_id in &proposal_ids {
        match engine.execute_proposal(proposal_id).await {
            Ok(outcome) => {
                if outcome.passed() {
                    if let Some(result) = evaluate(rt, &agents, proposal_id).await {
                        evaluations.push(result);
                    }
                }
                outcomes.push((proposal_id, outcome));
            }
            Err(e) => warn!("⚠️ Proposal #{} could not be executed: {}", proposal_id, e),
        }
        pace().await;
    }

    let swept = rt.ledger.sweep_expired().await;
    if swept > 0 {
        info!("🧹 {} stale payment requests expired", swept);
    }

    let snapshot = engine.snapshot().await;
    log_report(&snapshot.stats, &snapshot.payments);
    engine.publish(DaoEvent::SimulationComplete {
        stats: snapshot.stats.clone(),
        agents: snapshot.agents,
        proposals: snapshot.proposals,
    });

    Ok(SimulationReport { stats: snapshot.stats, outcomes, evaluations })
}

/// Every voter makes up its mind concurrently; results follow `voters` order.
async fn deliberate(rt: &DaoRuntime, voters: &[&Agent], context: &str) -> Vec<VoteChoice> {
    for agent in voters {
        rt.engine.publish(DaoEvent::AgentThinking { agent_name: agent.name().to_string() });
    }
    join_all(voters.iter().map(|agent| rt.deliberator.choose_vote(agent, context))).await
}

/// The creator of a passed proposal buys a feasibility check for it.
async fn evaluate(rt: &DaoRuntime, agents: &[Agent], proposal_id: ProposalId) -> Option<ServiceResult> {
    let proposal = rt.engine.proposal(proposal_id).await?;
    let creator = agents.iter().find(|a| a.id() == &proposal.creator)?;
    match rt.services.purchase(creator, EVALUATION_SERVICE, &proposal.title).await {
        Ok(purchase) => {
            info!("📋 {}", purchase.result.result);
            rt.engine.publish(DaoEvent::Payment(purchase.payment));
            Some(purchase.result)
        }
        Err(e) => {
            warn!("⚠️ Evaluation of Proposal #{} skipped: {}", proposal_id, e);
            None
        }
    }
}

fn log_report(stats: &DaoStats, payments: &[agentdao_ledger::PaymentSummary]) {
    info!("📊 FINAL DAO STATISTICS");
    info!("   Total Agents: {}", stats.total_agents);
    info!("   Total Proposals: {}", stats.total_proposals);
    info!("   Passed: {}", stats.passed_proposals);
    info!("   Rejected: {}", stats.rejected_proposals);
    info!("   Treasury Balance: {} SOL", lamports_to_sol(stats.treasury_balance));
    info!("💳 x402 PAYMENT STATISTICS");
    info!("   Total Payments: {}", stats.x402_payments.total);
    info!("   Completed: {}", stats.x402_payments.completed);
    info!("   Failed: {}", stats.x402_payments.failed);
    info!("   Total Volume: {} SOL", lamports_to_sol(stats.x402_payments.total_volume));
    info!("📜 PAYMENT HISTORY");
    for (i, payment) in payments.iter().enumerate() {
        info!("   {}. {} - {} SOL [{:?}]", i + 1, payment.description, lamports_to_sol(payment.amount), payment.status);
    }
}
