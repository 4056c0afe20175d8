//! History record shapes shared by the history store and its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transcript::ChatMessage;

/// Payload submitted once per finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub session_id: String,
    pub case_id: String,
    pub messages: Vec<ChatMessage>,
    pub final_score: f64,
    /// The agent's final state with the per-event breakdown under `eventScores`.
    pub final_state: Value,
}

/// A history record as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredHistory {
    pub session_id: String,
    pub user_id: String,
    pub case_id: String,
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub final_score: f64,
    #[serde(default)]
    pub final_state: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredHistory {
    /// The per-event breakdown embedded in the final state.
    pub fn event_scores(&self) -> Option<&serde_json::Map<String, Value>> {
        self.final_state
            .get("eventScores")
            .and_then(Value::as_object)
    }

    /// The agent's closing scene summary, when it sent one.
    pub fn scene_summary(&self) -> Option<&str> {
        self.final_state
            .get("scene_summary")
            .and_then(Value::as_str)
    }
}

/// Response of `POST /api/sessions/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveHistoryResponse {
    pub message: String,
    pub history: StoredHistory,
}
