use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use agentdao_common::utils::amount::sol_to_lamports;
use agentdao_common::{DaoError, Result, Wallet};
use agentdao_governance::{Agent, DaoEvent, GovernanceEngine};
use agentdao_ledger::{PaymentLedger, SimulatedRail};

use crate::config::Config;
use crate::decision::{Deliberator, HttpDecisionMaker};
use crate::services::ServiceDesk;

/// Everything one DAO run needs, wired together.
pub struct DaoRuntime {
    pub config: Config,
    pub rail: Arc<SimulatedRail>,
    pub ledger: Arc<PaymentLedger>,
    pub engine: Arc<GovernanceEngine>,
    pub deliberator: Arc<Deliberator>,
    pub services: Arc<ServiceDesk>,
}

impl DaoRuntime {
    /// Creates an agent and airdrops the configured seed funds to its wallet.
    pub async fn spawn_agent(&self, name: &str, personality: &str) -> Agent {
        let agent = Agent::new(name, personality);
        self.rail
            .fund(&agent.address(), sol_to_lamports(self.config.agent_seed_sol))
            .await;
        debug!("🤖 Agent {} created with wallet {}", name, agent.address());
        agent
    }

    /// Logs every engine event as its JSON envelope until the engine goes away.
    pub fn spawn_event_logger(&self) -> JoinHandle<()> {
        let mut rx = self.engine.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(skipped)) => warn!("📡 Event logger lagged, {} events dropped", skipped),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

fn log_event(event: &DaoEvent) {
    match serde_json::to_string(event) {
        Ok(json) => debug!("📡 Broadcast: {} {}", event.kind(), json),
        Err(e) => warn!("📡 Could not serialize {} event: {}", event.kind(), e),
    }
}

/// Builds a runtime whose decisions come from the configured endpoint, or
/// from chance when none is set.
pub async fn build_runtime(config: &Config) -> Result<DaoRuntime> {
    let deliberator = match HttpDecisionMaker::from_config(&config.decision)
        .map_err(|e| DaoError::Config(e.to_string()))?
    {
        Some(maker) => {
            info!("🧠 Decision endpoint configured, agents will consult it");
            Deliberator::new(Arc::new(maker))
        }
        None => {
            info!("🎲 No decision endpoint configured, agents decide at random");
            Deliberator::offline()
        }
    };
    build_runtime_with(config, deliberator).await
}

pub async fn build_runtime_with(config: &Config, deliberator: Deliberator) -> Result<DaoRuntime> {
    config.validate()?;

    let rail = Arc::new(SimulatedRail::new());
    let ledger = Arc::new(
        PaymentLedger::new(rail.clone())
            .with_ttl(config.payment_ttl())
            .with_network(config.network.clone()),
    );

    let treasury = Arc::new(Wallet::generate());
    rail.fund(&treasury.address(), sol_to_lamports(config.treasury_seed_sol)).await;

    let engine = Arc::new(GovernanceEngine::new(config.governance.clone(), treasury.clone(), ledger.clone()));
    let services = Arc::new(ServiceDesk::new(ledger.clone(), treasury.address()));

    Ok(DaoRuntime {
        config: config.clone(),
        rail,
        ledger,
        engine,
        deliberator: Arc::new(deliberator),
        services,
    })
}
