//! Shared test utilities for rehearse-server integration tests

#[allow(dead_code)]
pub mod agent;

use std::net::SocketAddr;
use std::sync::Arc;

use rehearse_core::Credential;
use rehearse_server::auth::DEFAULT_TOKEN_TTL;
use rehearse_server::{
    AppState, Identity, RehearseServer, ServerConfig, TokenValidator, TursoStorage,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const TEST_SECRET: &str = "integration-secret";

/// Creates a test server on an in-memory database, returns state and address
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, SocketAddr) {
    let storage = TursoStorage::new_memory().await.unwrap();
    let validator = TokenValidator::new(&SecretString::from(TEST_SECRET.to_string()));
    let state = Arc::new(AppState::new(storage, validator));

    let server = RehearseServer::with_state(ServerConfig::default(), Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: RehearseServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}

/// Base URL for a bound address
#[allow(dead_code)]
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

/// Mints a credential for a user against the server's secret
#[allow(dead_code)]
pub fn credential_for(state: &AppState, user_id: &str) -> Credential {
    let identity = Identity::new(user_id, format!("{}@example.com", user_id));
    Credential::new(state.validator.issue(&identity, DEFAULT_TOKEN_TTL).unwrap())
}

/// A three-event case document as accepted by `POST /api/cases`
#[allow(dead_code)]
pub fn three_event_case() -> Value {
    json!({
        "case_id": "case-night-shift",
        "skeleton": {
            "case_id": "case-night-shift",
            "title": "Night shift handover",
            "canon_events": [
                {"id": "CE1", "title": "Assess", "score_branches": {"5": "CE2", "4": "CE2", "3": "CE2", "2": "CE1", "1": "CE1"}},
                {"id": "CE2", "title": "Escalate", "score_branches": {"5": "CE3", "4": "CE3", "3": "CE3", "2": "CE2", "1": "CE2"}},
                {"id": "CE3", "title": "Hand over", "score_branches": {}}
            ]
        },
        "context": {"topic": "Ward triage"},
        "personas": {"personas": [{"id": "p-lan", "name": "Nurse Lan"}]}
    })
}

/// Seeds a case through the public API
#[allow(dead_code)]
pub async fn seed_case(addr: SocketAddr, case: &Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/api/cases", base_url(addr)))
        .json(case)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}
