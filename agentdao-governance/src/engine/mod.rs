pub mod config;

pub use config::{GovernanceConfig, ShortfallPolicy};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{info, warn};

use agentdao_common::utils::amount::lamports_to_sol;
use agentdao_common::{Address, Clock, EventBus, Wallet};
use agentdao_ledger::{PaymentId, PaymentLedger, PaymentSummary, VerifyFailure};

use crate::agent::{Agent, AgentId, AgentSummary};
use crate::errors::GovernanceError;
use crate::evaluator::{QuorumEvaluator, Verdict};
use crate::events::{DaoEvent, TallyView};
use crate::membership::{MemberSummary, MembershipRegistry};
use crate::proposals::{Proposal, ProposalId, ProposalStatus, ProposalStore, ProposalSummary, VoteChoice};
use crate::treasury::Treasury;
use crate::views::{DaoSnapshot, DaoStats};

const AUDIT: &str = "agentdao_governance::audit";

/// How `execute_proposal` resolved a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Passed; `payout` lamports moved to the creator (0 when nothing was requested).
    Passed { payout: u64 },
    /// Passed under `ShortfallPolicy::MarkPassed` with nothing paid.
    PassedWithoutPayout { requested: u64, available: u64 },
    Rejected,
    QuorumNotMet,
    /// Failed under `ShortfallPolicy::MarkFailed`.
    FailedInsufficientFunds { requested: u64, available: u64 },
}

impl ExecutionOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, ExecutionOutcome::Passed { .. } | ExecutionOutcome::PassedWithoutPayout { .. })
    }

    pub fn status(&self) -> ProposalStatus {
        match self {
            ExecutionOutcome::Passed { .. } | ExecutionOutcome::PassedWithoutPayout { .. } => ProposalStatus::Passed,
            ExecutionOutcome::Rejected => ProposalStatus::Rejected,
            ExecutionOutcome::QuorumNotMet | ExecutionOutcome::FailedInsufficientFunds { .. } => ProposalStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DaoState {
    members: MembershipRegistry,
    proposals: ProposalStore,
    treasury: Treasury,
}

/// Payment to collect before a guarded mutation.
struct Charge {
    amount: u64,
    description: String,
    resource: String,
}

impl Charge {
    fn new(amount: u64, description: impl Into<String>, resource: impl Into<String>) -> Self {
        Self { amount, description: description.into(), resource: resource.into() }
    }
}

/// The payment-gated state machine of the DAO.
///
/// Every operation holds the state lock from its precondition checks until
/// its mutation is applied, so pay, verify and mutate are never interleaved
/// with another governance action.
///
/// Reads never take that lock. They see the state as of the last finished
/// operation, published through a `watch` channel.
pub struct GovernanceEngine {
    config: GovernanceConfig,
    evaluator: QuorumEvaluator,
    treasury_wallet: Arc<Wallet>,
    payments: Arc<PaymentLedger>,
    clock: Arc<dyn Clock>,
    state: Mutex<DaoState>,
    committed: watch::Sender<Arc<DaoState>>,
    events: EventBus<DaoEvent>,
}

impl GovernanceEngine {
    pub fn new(config: GovernanceConfig, treasury_wallet: Arc<Wallet>, payments: Arc<PaymentLedger>) -> Self {
        let clock = payments.clock();
        info!("🏛️ DAO initialized with treasury: {}", treasury_wallet.address());
        info!("💳 x402 payment ledger active on {:?}", payments);
        Self {
            evaluator: QuorumEvaluator::new(config.quorum.clone()),
            config,
            treasury_wallet,
            payments,
            clock,
            state: Mutex::new(DaoState::default()),
            committed: watch::channel(Arc::new(DaoState::default())).0,
            events: EventBus::default(),
        }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn treasury_address(&self) -> Address {
        self.treasury_wallet.address()
    }

    pub fn payment_ledger(&self) -> &Arc<PaymentLedger> {
        &self.payments
    }

    /// Admits `agent` after it pays `stake` into the treasury.
    pub async fn join_dao(&self, agent: Agent, stake: u64) -> Result<AgentSummary, GovernanceError> {
        let mut state = self.state.lock().await;

        if state.members.contains(agent.id()) {
            warn!("⚠️ Agent \"{}\" is already a member!", agent.name());
            return Err(GovernanceError::AlreadyMember(agent.id().clone()));
        }

        let name = agent.name().to_string();
        info!("👤 Agent \"{}\" attempting to join DAO...", name);
        let charge = Charge::new(stake, format!("DAO Membership Stake for {}", name), "dao/join");
        let payer = Arc::clone(agent.wallet());
        let treasury = self.treasury_address();

        let (joined, payment) = self
            .authorize_and_apply(&mut state, charge, &payer, &treasury, |state, now| {
                let member = state.members.join(agent, stake, now)?;
                let summary = member.agent.summary();
                state.treasury.credit(stake);
                Ok(summary)
            })
            .await
            .map_err(|e| {
                warn!("❌ Agent \"{}\" failed to join DAO: {}", name, e);
                e
            })?;

        let balance = state.treasury.balance();
        self.commit(&state);
        drop(state);

        info!("✅ Agent \"{}\" joined DAO via x402!", joined.name);
        info!("💰 Treasury balance: {} SOL", lamports_to_sol(balance));
        info!(target: AUDIT, "EVENT:JOIN agent={} stake={}", joined.id, stake);

        self.events.publish(DaoEvent::MemberJoined { agent: joined.clone(), treasury: balance });
        self.events.publish(DaoEvent::Payment(payment));
        Ok(joined)
    }

    /// Opens a proposal on behalf of a member who pays `fee`.
    pub async fn create_proposal(
        &self,
        agent_id: &AgentId,
        title: impl Into<String>,
        description: impl Into<String>,
        requested: u64,
        fee: u64,
    ) -> Result<Proposal, GovernanceError> {
        let title = title.into();
        let description = description.into();
        let mut state = self.state.lock().await;

        let Some(member) = state.members.get(agent_id) else {
            warn!("⚠️ Agent {} is not a DAO member!", agent_id);
            return Err(GovernanceError::NotMember(agent_id.clone()));
        };
        let payer = Arc::clone(member.agent.wallet());
        let creator_name = member.agent.name().to_string();

        info!("📝 Agent \"{}\" creating proposal...", creator_name);
        let charge = Charge::new(fee, format!("Proposal Creation Fee: \"{}\"", title), "dao/proposal/create");
        let treasury = self.treasury_address();

        let (proposal, payment) = self
            .authorize_and_apply(&mut state, charge, &payer, &treasury, |state, now| {
                let power = state.members.total_voting_power();
                let proposal = state
                    .proposals
                    .create(agent_id.clone(), creator_name, title, description, requested, power, now)
                    .clone();
                state.treasury.credit(fee);
                if let Some(member) = state.members.get_mut(agent_id) {
                    member.agent.record_proposal();
                }
                Ok(proposal)
            })
            .await
            .map_err(|e| {
                warn!("❌ Proposal creation failed: {}", e);
                e
            })?;
        self.commit(&state);
        drop(state);

        info!("✅ Proposal #{} created via x402: \"{}\"", proposal.id, proposal.title);
        info!(target: AUDIT, "EVENT:PROPOSE id={} creator={} requested={}", proposal.id, agent_id, requested);

        self.events.publish(DaoEvent::ProposalCreated(proposal.summary()));
        self.events.publish(DaoEvent::Payment(payment));
        Ok(proposal)
    }

    /// Records a member's vote, weighted by its voting power, after it pays `fee`.
    pub async fn vote(
        &self,
        agent_id: &AgentId,
        proposal_id: ProposalId,
        choice: VoteChoice,
        fee: u64,
    ) -> Result<Proposal, GovernanceError> {
        let mut state = self.state.lock().await;

        let Some(member) = state.members.get(agent_id) else {
            warn!("⚠️ Agent {} is not a DAO member!", agent_id);
            return Err(GovernanceError::NotMember(agent_id.clone()));
        };
        let payer = Arc::clone(member.agent.wallet());
        let voter_name = member.agent.name().to_string();
        let power = member.voting_power;

        if let Err(e) = state.proposals.ensure_can_vote(proposal_id, agent_id) {
            warn!("⚠️ Vote by \"{}\" refused: {}", voter_name, e);
            return Err(e);
        }

        info!("🗳️ Agent \"{}\" voting on Proposal #{}...", voter_name, proposal_id);
        let charge = Charge::new(
            fee,
            format!("Vote on Proposal #{} by {}", proposal_id, voter_name),
            format!("dao/proposal/{}/vote", proposal_id),
        );
        let treasury = self.treasury_address();

        let (proposal, payment) = self
            .authorize_and_apply(&mut state, charge, &payer, &treasury, |state, now| {
                let proposal = state.proposals.record_vote(proposal_id, agent_id, choice, power, now)?.clone();
                state.treasury.credit(fee);
                if let Some(member) = state.members.get_mut(agent_id) {
                    member.agent.record_vote();
                }
                Ok(proposal)
            })
            .await
            .map_err(|e| {
                warn!("❌ Vote failed: {}", e);
                e
            })?;
        self.commit(&state);
        drop(state);

        info!(
            "✅ Vote recorded via x402: {} (for: {} SOL, against: {} SOL)",
            choice.to_string().to_uppercase(),
            lamports_to_sol(proposal.votes_for),
            lamports_to_sol(proposal.votes_against)
        );
        info!(target: AUDIT, "EVENT:VOTE proposal={} agent={} choice={} power={}", proposal_id, agent_id, choice, power);

        self.events.publish(DaoEvent::VoteCast {
            agent: voter_name,
            vote: choice,
            proposal: TallyView {
                id: proposal.id,
                votes_for: proposal.votes_for,
                votes_against: proposal.votes_against,
            },
        });
        self.events.publish(DaoEvent::Payment(payment));
        Ok(proposal)
    }

    /// Closes an active proposal and, if it passed, pays the creator from the treasury.
    ///
    /// A failed payout leaves the proposal `active` so it can be executed
    /// again. Once the payout transfer has settled its request is kept on the
    /// proposal, and later attempts only re-verify that request.
    pub async fn execute_proposal(&self, proposal_id: ProposalId) -> Result<ExecutionOutcome, GovernanceError> {
        let mut state = self.state.lock().await;
        let result = self.execute_locked(&mut state, proposal_id).await;
        self.commit(&state);
        drop(state);
        let (outcome, payment) = result?;

        info!(target: AUDIT, "EVENT:EXECUTE proposal={} outcome={:?}", proposal_id, outcome);

        self.events.publish(DaoEvent::ProposalExecuted {
            proposal_id,
            status: outcome.status(),
            passed: outcome.passed(),
        });
        if let Some(payment) = payment {
            self.events.publish(DaoEvent::Payment(payment));
        }
        Ok(outcome)
    }

    async fn execute_locked(
        &self,
        state: &mut DaoState,
        proposal_id: ProposalId,
    ) -> Result<(ExecutionOutcome, Option<PaymentSummary>), GovernanceError> {
        let proposal = state
            .proposals
            .get(proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        if proposal.status.is_terminal() {
            warn!("⚠️ Proposal #{} is not active!", proposal_id);
            return Err(GovernanceError::NotActive(proposal_id));
        }

        info!("⚖️ Executing Proposal #{}...", proposal_id);
        let settled_payout = proposal.payout_payment;
        let verdict = match settled_payout {
            // The creator already holds the funds; the vote is not reopened.
            Some(_) => Verdict::Passed,
            None => self.evaluator.evaluate_proposal(proposal, state.members.total_voting_power()).verdict,
        };
        let creator = proposal.creator.clone();
        let requested = proposal.requested_amount;
        let available = state.treasury.balance();
        let now = self.clock.now();

        let resolved = match verdict {
            Verdict::QuorumNotMet => {
                state.proposals.finalize(proposal_id, ProposalStatus::Failed, None)?;
                info!("❌ Proposal #{} FAILED - Quorum not met", proposal_id);
                (ExecutionOutcome::QuorumNotMet, None)
            }
            Verdict::Rejected => {
                state.proposals.finalize(proposal_id, ProposalStatus::Rejected, None)?;
                if let Some(member) = state.members.get_mut(&creator) {
                    member.agent.penalize(self.config.reputation_penalty);
                }
                info!("❌ Proposal #{} REJECTED", proposal_id);
                (ExecutionOutcome::Rejected, None)
            }
            Verdict::Passed if requested == 0 => {
                state.proposals.finalize(proposal_id, ProposalStatus::Passed, Some(now))?;
                if let Some(member) = state.members.get_mut(&creator) {
                    member.agent.reward(self.config.reputation_bonus);
                }
                info!("✅ Proposal #{} PASSED (no fund transfer)", proposal_id);
                (ExecutionOutcome::Passed { payout: 0 }, None)
            }
            Verdict::Passed if settled_payout.is_none() && available < requested => match self.config.shortfall {
                ShortfallPolicy::MarkPassed => {
                    state.proposals.finalize(proposal_id, ProposalStatus::Passed, Some(now))?;
                    warn!(
                        "⚠️ Proposal #{} PASSED without payout: requested {} SOL, treasury holds {} SOL",
                        proposal_id,
                        lamports_to_sol(requested),
                        lamports_to_sol(available)
                    );
                    (ExecutionOutcome::PassedWithoutPayout { requested, available }, None)
                }
                ShortfallPolicy::MarkFailed => {
                    state.proposals.finalize(proposal_id, ProposalStatus::Failed, None)?;
                    warn!(
                        "❌ Proposal #{} FAILED - treasury holds {} SOL, {} SOL requested",
                        proposal_id,
                        lamports_to_sol(available),
                        lamports_to_sol(requested)
                    );
                    (ExecutionOutcome::FailedInsufficientFunds { requested, available }, None)
                }
            },
            Verdict::Passed => {
                let resource = format!("dao/proposal/{}/payout", proposal_id);
                let payout = match settled_payout {
                    Some(payment) => {
                        info!("🔁 Re-verifying settled payout {} for Proposal #{}", payment.short(), proposal_id);
                        payment
                    }
                    None => {
                        let recipient = state
                            .members
                            .get(&creator)
                            .map(|m| m.agent.address())
                            .ok_or_else(|| GovernanceError::NotMember(creator.clone()))?;
                        let charge = Charge::new(requested, format!("Payout for Proposal #{}", proposal_id), resource.as_str());
                        let payment = self.settle(&charge, &self.treasury_wallet, &recipient).await.map_err(|e| {
                            warn!("❌ Payout for Proposal #{} failed, proposal stays active: {}", proposal_id, e);
                            e
                        })?;
                        state.proposals.record_payout(proposal_id, payment)?;
                        payment
                    }
                };
                let bonus = self.config.reputation_bonus;

                let ((), payment) = self
                    .apply_verified(state, &payout, &resource, |state, now| {
                        state.treasury.debit(requested)?;
                        state.proposals.finalize(proposal_id, ProposalStatus::Passed, Some(now))?;
                        if let Some(member) = state.members.get_mut(&creator) {
                            member.agent.reward(bonus);
                        }
                        Ok(())
                    })
                    .await
                    .map_err(|e| {
                        warn!("❌ Payout for Proposal #{} not verified, proposal stays active: {}", proposal_id, e);
                        e
                    })?;

                info!("✅ Proposal #{} PASSED", proposal_id);
                info!(
                    "💰 Transferred {} SOL from treasury, balance: {} SOL",
                    lamports_to_sol(requested),
                    lamports_to_sol(state.treasury.balance())
                );
                (ExecutionOutcome::Passed { payout: requested }, Some(payment))
            }
        };
        Ok(resolved)
    }

    /// Mints `charge`, has `payer` settle it to `recipient`, verifies the
    /// settlement and only then applies `mutation`.
    ///
    /// Any error before `mutation` runs leaves `state` untouched.
    async fn authorize_and_apply<T>(
        &self,
        state: &mut DaoState,
        charge: Charge,
        payer: &Wallet,
        recipient: &Address,
        mutation: impl FnOnce(&mut DaoState, DateTime<Utc>) -> Result<T, GovernanceError>,
    ) -> Result<(T, PaymentSummary), GovernanceError> {
        let payment = self.settle(&charge, payer, recipient).await?;
        self.apply_verified(state, &payment, &charge.resource, mutation).await
    }

    async fn settle(&self, charge: &Charge, payer: &Wallet, recipient: &Address) -> Result<PaymentId, GovernanceError> {
        let request = self
            .payments
            .create_requirement(charge.amount, charge.description.as_str(), charge.resource.as_str())
            .await?;
        self.payments.pay(&request.id, payer, recipient).await?;
        Ok(request.id)
    }

    async fn apply_verified<T>(
        &self,
        state: &mut DaoState,
        payment: &PaymentId,
        resource: &str,
        mutation: impl FnOnce(&mut DaoState, DateTime<Utc>) -> Result<T, GovernanceError>,
    ) -> Result<(T, PaymentSummary), GovernanceError> {
        let verified = self.payments.verify(payment).await?;
        let summary = self
            .payments
            .get(payment)
            .await
            .map(|r| r.summary())
            .ok_or(VerifyFailure::NotFound(*payment))?;

        let value = mutation(state, self.clock.now())?;
        info!(
            target: AUDIT,
            "EVENT:AUTHORIZED resource={} payment={} amount={}",
            resource,
            verified.id,
            verified.amount
        );
        Ok((value, summary))
    }

    /// Publishes `state` to readers.
    fn commit(&self, state: &DaoState) {
        self.committed.send_replace(Arc::new(state.clone()));
    }

    fn view(&self) -> Arc<DaoState> {
        self.committed.borrow().clone()
    }

    pub async fn treasury_balance(&self) -> u64 {
        self.view().treasury.balance()
    }

    pub async fn is_member(&self, agent_id: &AgentId) -> bool {
        self.view().members.contains(agent_id)
    }

    pub async fn members(&self) -> Vec<MemberSummary> {
        self.view().members.list().into_iter().map(|m| m.summary()).collect()
    }

    /// Member agents in join order.
    pub async fn agents(&self) -> Vec<AgentSummary> {
        self.view().members.list().into_iter().map(|m| m.agent.summary()).collect()
    }

    pub async fn agent(&self, agent_id: &AgentId) -> Option<Agent> {
        self.view().members.get(agent_id).map(|m| m.agent.clone())
    }

    pub async fn total_voting_power(&self) -> u64 {
        self.view().members.total_voting_power()
    }

    pub async fn proposal(&self, proposal_id: ProposalId) -> Option<Proposal> {
        self.view().proposals.get(proposal_id).cloned()
    }

    pub async fn proposals(&self) -> Vec<Proposal> {
        self.view().proposals.list().into_iter().cloned().collect()
    }

    pub async fn proposal_summaries(&self) -> Vec<ProposalSummary> {
        self.view().proposals.list().into_iter().map(Proposal::summary).collect()
    }

    pub async fn payments(&self) -> Vec<PaymentSummary> {
        self.payments.list().await
    }

    pub async fn stats(&self) -> DaoStats {
        let mut stats = Self::count(&self.view());
        stats.x402_payments = self.payments.stats().await;
        stats
    }

    pub async fn snapshot(&self) -> DaoSnapshot {
        let state = self.view();
        let agents = state.members.list().into_iter().map(|m| m.agent.summary()).collect();
        let proposals = state.proposals.list().into_iter().map(Proposal::summary).collect();
        let mut stats = Self::count(&state);
        stats.x402_payments = self.payments.stats().await;
        DaoSnapshot { agents, proposals, stats, payments: self.payments.list().await }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DaoEvent> {
        self.events.subscribe()
    }

    /// Publishes an event that did not come from a state transition.
    pub fn publish(&self, event: DaoEvent) {
        self.events.publish(event);
    }

    fn count(state: &DaoState) -> DaoStats {
        DaoStats {
            total_agents: state.members.len(),
            total_proposals: state.proposals.len(),
            active_proposals: state.proposals.count_by_status(ProposalStatus::Active),
            passed_proposals: state.proposals.count_by_status(ProposalStatus::Passed),
            rejected_proposals: state.proposals.count_by_status(ProposalStatus::Rejected),
            treasury_balance: state.treasury.balance(),
            x402_payments: Default::default(),
        }
    }
}

impl std::fmt::Debug for GovernanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceEngine")
            .field("config", &self.config)
            .field("treasury", &self.treasury_wallet.address())
            .finish()
    }
}
