//! Scripted stand-in for the agent service

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const EXHAUSTED: &str = "script exhausted";

/// Replays canned responses and records what it received
#[derive(Default)]
pub struct FakeAgent {
    pub start: Mutex<Value>,
    pub turns: Mutex<VecDeque<Value>>,
    pub received: Mutex<Vec<Value>>,
}

impl FakeAgent {
    pub fn new(start: Value, turns: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            start: Mutex::new(start),
            turns: Mutex::new(turns.into()),
            received: Mutex::new(Vec::new()),
        })
    }
}

async fn start_session(
    State(agent): State<Arc<FakeAgent>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    agent.received.lock().unwrap().push(body);
    Json(agent.start.lock().unwrap().clone())
}

async fn submit_turn(
    State(agent): State<Arc<FakeAgent>>,
    Path(session_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    assert_eq!(body["session_id"], session_id.as_str());
    agent.received.lock().unwrap().push(body);
    agent
        .turns
        .lock()
        .unwrap()
        .pop_front()
        .map(Json)
        .ok_or((StatusCode::SERVICE_UNAVAILABLE, EXHAUSTED.to_string()))
}

/// Serves the fake agent on an ephemeral port
pub async fn spawn_agent(agent: Arc<FakeAgent>) -> SocketAddr {
    let router = Router::new()
        .route("/api/agent/sessions", post(start_session))
        .route("/api/agent/sessions/:session_id/turn", post(submit_turn))
        .with_state(agent);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    addr
}

/// An agent state snapshot
pub fn state(
    current_event: Option<&str>,
    last_score: Option<f64>,
    dialogue: &[(&str, &str)],
) -> Value {
    let summary = match last_score {
        Some(score) => json!({
            "last_score": score,
            "scores": [{"criterion": "Communication", "score": score, "analysis": "ok"}]
        }),
        None => json!({}),
    };
    let history: Vec<Value> = dialogue
        .iter()
        .map(|(speaker, content)| json!({"speaker": speaker, "content": content}))
        .collect();
    json!({
        "session_id": "agent-session-1",
        "current_event": current_event,
        "event_summary": summary,
        "dialogue_history": history,
        "active_personas": {"p-lan": {"id": "p-lan", "name": "Nurse Lan"}},
        "scene_summary": "Ward at night"
    })
}

/// A turn response wrapping a state
pub fn turn(state: Value) -> Value {
    json!({ "state": state })
}

/// A session-start response
pub fn started(state: Value) -> Value {
    json!({ "session_id": "agent-session-1", "state": state })
}
