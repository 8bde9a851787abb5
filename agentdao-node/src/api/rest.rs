use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{error, info};

use agentdao_governance::DaoSnapshot;

use crate::config::Config;
use crate::runtime::builder::{build_runtime, DaoRuntime};
use crate::runtime::simulation::run_simulation;
use crate::services::{default_catalog, ServiceOffer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Runtime of the latest simulation, kept after it finishes.
    pub current: Arc<RwLock<Option<Arc<DaoRuntime>>>>,
    pub running: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            current: Arc::new(RwLock::new(None)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Clears the running flag when dropped, including while unwinding from a panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/dao-state", get(dao_state_api))
        .route("/api/start-simulation", post(start_simulation_api))
        .route("/api/services", get(services_api))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

pub async fn start_rest_api(port: u16, state: AppState) -> std::io::Result<()> {
    info!("REST API listening on 0.0.0.0:{}", port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    serve(listener, state).await
}

async fn dao_state_api(State(state): State<AppState>) -> Json<DaoSnapshot> {
    let runtime = state.current.read().await.clone();
    match runtime {
        Some(rt) => Json(rt.engine.snapshot().await),
        None => Json(DaoSnapshot::default()),
    }
}

async fn start_simulation_api(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state
        .running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Simulation already running" })));
    }

    let runtime = match build_runtime(&state.config).await {
        Ok(rt) => Arc::new(rt),
        Err(e) => {
            state.running.store(false, Ordering::SeqCst);
            error!("Simulation setup failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })));
        }
    };
    runtime.spawn_event_logger();
    *state.current.write().await = Some(Arc::clone(&runtime));

    let guard = RunningGuard(Arc::clone(&state.running));
    tokio::spawn(async move {
        let _guard = guard;
        if let Err(e) = run_simulation(&runtime).await {
            error!("Simulation error: {}", e);
        }
    });

    (StatusCode::OK, Json(json!({ "message": "Simulation started" })))
}

async fn services_api(State(state): State<AppState>) -> Json<Vec<ServiceOffer>> {
    let runtime = state.current.read().await.clone();
    match runtime {
        Some(rt) => Json(rt.services.catalog().to_vec()),
        None => Json(default_catalog()),
    }
}
