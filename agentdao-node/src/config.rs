use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use agentdao_common::utils::amount::sol_to_lamports;
use agentdao_common::{DaoError, Result};
use agentdao_governance::GovernanceConfig;
use agentdao_ledger::{DEFAULT_NETWORK, DEFAULT_TTL_SECS, MAX_TTL_SECS};

/// Endpoint of the language model that agents consult before voting.
///
/// With no `api_url` every decision falls back to a random pick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub api_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: "claude-3-sonnet-20240229".to_string(),
            max_tokens: 500,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: String,
    pub payment_ttl_secs: u64,
    pub join_stake_sol: f64,
    pub proposal_fee_sol: f64,
    pub vote_fee_sol: f64,
    pub governance: GovernanceConfig,
    /// Airdropped to the treasury wallet on the rail at startup.
    pub treasury_seed_sol: f64,
    /// Airdropped to every simulated agent's wallet.
    pub agent_seed_sol: f64,
    pub decision: DecisionConfig,
    pub rest_port: u16,
    pub audit_log: String,
    /// Pause between simulation steps.
    pub pacing_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            payment_ttl_secs: DEFAULT_TTL_SECS,
            join_stake_sol: 0.1,
            proposal_fee_sol: 0.01,
            vote_fee_sol: 0.001,
            governance: GovernanceConfig::default(),
            treasury_seed_sol: 5.0,
            agent_seed_sol: 1.0,
            decision: DecisionConfig::default(),
            rest_port: 3001,
            audit_log: "logs/audit.log".to_string(),
            pacing_ms: 1000,
        }
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("JOINING_STAKE_SOL") {
            self.join_stake_sol = parse_sol("JOINING_STAKE_SOL", &v)?;
        }
        if let Some(v) = lookup("PROPOSAL_COST_SOL") {
            self.proposal_fee_sol = parse_sol("PROPOSAL_COST_SOL", &v)?;
        }
        if let Some(v) = lookup("VOTING_COST_SOL") {
            self.vote_fee_sol = parse_sol("VOTING_COST_SOL", &v)?;
        }
        if let Some(v) = lookup("DECISION_API_URL") {
            self.decision.api_url = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("DECISION_API_KEY") {
            self.decision.api_key = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("PORT") {
            self.rest_port = v
                .trim()
                .parse()
                .map_err(|_| DaoError::Config(format!("PORT must be a port number, got {:?}", v)))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("join_stake_sol", self.join_stake_sol),
            ("proposal_fee_sol", self.proposal_fee_sol),
            ("vote_fee_sol", self.vote_fee_sol),
        ] {
            if sol_to_lamports(value) == 0 {
                return Err(DaoError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        let fraction = self.governance.quorum.fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(DaoError::Config(format!("quorum fraction must be in (0, 1], got {}", fraction)));
        }
        if self.payment_ttl_secs == 0 || self.payment_ttl_secs > MAX_TTL_SECS {
            return Err(DaoError::Config(format!(
                "payment_ttl_secs must be in 1..={}, got {}",
                MAX_TTL_SECS, self.payment_ttl_secs
            )));
        }
        Ok(())
    }

    pub fn join_stake(&self) -> u64 {
        sol_to_lamports(self.join_stake_sol)
    }

    pub fn proposal_fee(&self) -> u64 {
        sol_to_lamports(self.proposal_fee_sol)
    }

    pub fn vote_fee(&self) -> u64 {
        sol_to_lamports(self.vote_fee_sol)
    }

    pub fn payment_ttl(&self) -> Duration {
        Duration::from_secs(self.payment_ttl_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

fn parse_sol(key: &str, value: &str) -> Result<f64> {
    let sol: f64 = value
        .trim()
        .parse()
        .map_err(|_| DaoError::Config(format!("{} must be a SOL amount, got {:?}", key, value)))?;
    if !sol.is_finite() || sol <= 0.0 {
        return Err(DaoError::Config(format!("{} must be positive, got {}", key, sol)));
    }
    Ok(sol)
}
