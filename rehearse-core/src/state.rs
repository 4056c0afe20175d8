//! Wire schema for the external agent service.
//!
//! The agent owns [`SessionState`] and sends a full snapshot on every turn.
//! Every field here is optional or defaulted so that a partially malformed
//! response degrades to "no attribution" instead of an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::case::Persona;
use crate::lenient;

/// Status value the agent uses for a completed canon event.
pub const STATUS_PASS: &str = "pass";

/// One per-criterion score record reported by the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterion: Option<String>,
    #[serde(default, deserialize_with = "lenient::score")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CriterionScore {
    pub fn new(criterion: impl Into<String>, score: f64) -> Self {
        Self {
            criterion: Some(criterion.into()),
            score: Some(score),
            ..Self::default()
        }
    }

    pub fn with_analysis(mut self, analysis: impl Into<String>) -> Self {
        self.analysis = Some(analysis.into());
        self
    }
}

/// Scoring summary attached to a session state.
///
/// Besides `last_score` and `scores`, the agent stores per-event statuses
/// directly in the same object, keyed by canon event id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Rubric score most recently assigned, for the event current before this turn.
    #[serde(
        default,
        deserialize_with = "lenient::score",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub scores: Vec<CriterionScore>,
    #[serde(flatten)]
    pub statuses: Map<String, Value>,
}

impl EventSummary {
    /// Status string recorded for an event id.
    pub fn status_of(&self, event_id: &str) -> Option<&str> {
        self.statuses.get(event_id).and_then(Value::as_str)
    }

    /// Returns true if the event is marked as passed.
    pub fn is_passed(&self, event_id: &str) -> bool {
        self.status_of(event_id) == Some(STATUS_PASS)
    }
}

/// One line of dialogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub content: String,
}

impl DialogueTurn {
    pub fn new(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
        }
    }
}

/// Snapshot of a session as owned by the agent service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(
        default,
        deserialize_with = "lenient::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<String>,
    /// Canon event in progress; absent once the session has concluded.
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub current_event: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub event_summary: Option<EventSummary>,
    /// Full dialogue so far, not a delta.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub dialogue_history: Vec<DialogueTurn>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub active_personas: BTreeMap<String, Persona>,
    /// Fields this crate does not interpret (scene summary, emotions, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionState {
    /// The score reported on this snapshot, if any.
    pub fn last_score(&self) -> Option<f64> {
        self.event_summary.as_ref().and_then(|s| s.last_score)
    }

    /// Per-criterion detail behind `last_score`.
    pub fn detail_scores(&self) -> &[CriterionScore] {
        self.event_summary
            .as_ref()
            .map(|s| s.scores.as_slice())
            .unwrap_or_default()
    }
}

/// Body of `POST /api/agent/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lazy_init: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_tts: Option<bool>,
    pub user_action: String,
}

/// Response of `POST /api/agent/sessions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartSessionResponse {
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub state: Option<SessionState>,
}

/// Body of `POST /api/agent/sessions/{id}/turn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub session_id: String,
    pub user_input: String,
}

/// Response of `POST /api/agent/sessions/{id}/turn`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub state: Option<SessionState>,
}
