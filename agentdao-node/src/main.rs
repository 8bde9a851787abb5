use agentdao_node::{
    api::rest::{start_rest_api, AppState},
    cli::Args,
    config::Config,
    logging::{crash_log_path, init_logging, install_panic_hook},
    runtime::{builder::build_runtime, simulation::run_simulation},
};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Arguments
    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        Config::default().save_to_file(path)?;
        println!("Default config written to {}", path.display());
        return Ok(());
    }

    // 2. Config, then env and CLI overrides
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    if let Some(port) = args.port {
        config.rest_port = port;
    }

    // 3. Logging; the guard flushes the audit file on exit
    install_panic_hook(crash_log_path(&config.audit_log));
    let _guard = init_logging(&config.audit_log)?;

    info!("--- AGENTDAO ---");
    info!(
        "Stake: {} SOL | Proposal fee: {} SOL | Vote fee: {} SOL | Network: {}",
        config.join_stake_sol, config.proposal_fee_sol, config.vote_fee_sol, config.network
    );

    // 4. Serve or run once
    if args.serve {
        let port = config.rest_port;
        start_rest_api(port, AppState::new(config)).await?;
        return Ok(());
    }

    let runtime = build_runtime(&config).await?;
    let logger = runtime.spawn_event_logger();
    match run_simulation(&runtime).await {
        Ok(report) => {
            for (id, outcome) in &report.outcomes {
                info!("Proposal #{} -> {:?}", id, outcome);
            }
        }
        Err(e) => {
            error!("Simulation failed: {}", e);
            return Err(e.into());
        }
    }
    drop(runtime);
    let _ = logger.await;

    Ok(())
}
