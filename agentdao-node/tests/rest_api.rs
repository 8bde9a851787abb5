use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;

use agentdao_node::api::rest::{serve, AppState};
use agentdao_node::config::Config;

async fn spawn_api(config: Config) -> (String, AppState) {
    let state = AppState::new(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_state = state.clone();
    tokio::spawn(async move {
        serve(listener, server_state).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

async fn wait_until_idle(state: &AppState) {
    for _ in 0..600 {
        if !state.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("simulation did not finish");
}

#[tokio::test]
async fn test_empty_state_before_any_run() {
    let (base, _state) = spawn_api(Config::default()).await;

    let body: Value = reqwest::get(format!("{}/api/dao-state", base)).await.unwrap().json().await.unwrap();
    assert_eq!(body["agents"], serde_json::json!([]));
    assert_eq!(body["proposals"], serde_json::json!([]));
    assert_eq!(body["payments"], serde_json::json!([]));
    assert_eq!(body["stats"]["totalAgents"], 0);
    assert_eq!(body["stats"]["x402Payments"]["total"], 0);
}

#[tokio::test]
async fn test_services_catalog() {
    let (base, _state) = spawn_api(Config::default()).await;

    let body: Value = reqwest::get(format!("{}/api/services", base)).await.unwrap().json().await.unwrap();
    let names: Vec<_> = body.as_array().unwrap().iter().map(|s| s["name"].as_str().unwrap().to_string()).collect();
    assert_eq!(names, ["data-analysis", "proposal-evaluation", "research"]);
    assert_eq!(body[0]["cost"], 0.1);
}

#[tokio::test]
async fn test_start_simulation_once_at_a_time() {
    let (base, state) = spawn_api(Config { pacing_ms: 50, ..Config::default() }).await;
    let client = reqwest::Client::new();

    let resp = client.post(format!("{}/api/start-simulation", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Simulation started");

    let resp = client.post(format!("{}/api/start-simulation", base)).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Simulation already running");

    wait_until_idle(&state).await;

    let body: Value = client
        .get(format!("{}/api/dao-state", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["stats"]["totalAgents"], 5);
    assert_eq!(body["stats"]["totalProposals"], 2);
    assert_eq!(body["stats"]["activeProposals"], 0);
    assert_eq!(body["proposals"][0]["title"], "Build AI Research Lab");
    assert_eq!(body["proposals"][1]["creatorName"], "Diana_Visionary");
    assert!(body["payments"].as_array().unwrap().len() >= 17);

    // A finished run frees the slot for the next one.
    let resp = client.post(format!("{}/api/start-simulation", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    wait_until_idle(&state).await;
}
