//! Session controller.
//!
//! A [`SessionController`] owns every piece of per-session state: the event
//! sequencer, the score aggregator, the history latch, the transcript and the
//! latest agent snapshot. One controller drives one run-through of a case and
//! is dropped when the trainee leaves.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::Result;
use crate::auth::Credential;
use crate::case::CaseBundle;
use crate::engine::{
    EventScoreRecord, EventSequencer, FinalizeOutcome, HistoryRecorder, RecorderPhase,
    ScoreAggregator, SessionResult, Termination, termination,
};
use crate::history::HistoryRecord;
use crate::state::{SessionState, StartSessionRequest, TurnRequest};
use crate::traits::{AgentService, CaseStore, HistorySink};
use crate::transcript::{ChatMessage, Transcript};

/// Opening action sent when a session starts.
pub const DEFAULT_OPENING_ACTION: &str = "Begin the mission.";

/// Key under which the per-event breakdown is embedded in the final state.
pub const EVENT_SCORES_KEY: &str = "eventScores";

/// Options for [`SessionController::start`].
#[derive(Debug, Clone)]
pub struct StartOptions {
    /// Let the agent defer scene generation until the first real turn.
    pub lazy_init: bool,
    pub skip_tts: bool,
    /// Sent as the first `user_action`. Not scored when `lazy_init` is set.
    pub opening_action: String,
    /// Bearer token for the history store. `None` plays anonymously.
    pub credential: Option<Credential>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            lazy_init: true,
            skip_tts: true,
            opening_action: DEFAULT_OPENING_ACTION.to_string(),
            credential: None,
        }
    }
}

/// Result of [`SessionController::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Blank input, no session id, or the session already ended.
    Ignored,
    /// The agent could not be reached or rejected the turn.
    Failed(String),
    /// The agent answered without a state; nothing advanced.
    Unchanged,
    Advanced(TurnReport),
}

/// What one accepted turn did to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    /// The event the turn's score belongs to.
    pub event_for_score: Option<String>,
    pub last_score: Option<f64>,
    /// True if the score was folded into the aggregate.
    pub attributed: bool,
    pub termination: Option<Termination>,
    pub finalize: FinalizeOutcome,
}

/// Drives one session of a case against the agent service.
pub struct SessionController {
    agent: Arc<dyn AgentService>,
    history: Arc<dyn HistorySink>,
    credential: Option<Credential>,
    case_id: String,
    case: CaseBundle,
    session_id: Option<String>,
    state: Option<SessionState>,
    sequencer: EventSequencer,
    aggregator: ScoreAggregator,
    recorder: HistoryRecorder,
    transcript: Transcript,
}

impl SessionController {
    /// Load the case and open a session with the agent.
    ///
    /// Fails only if the case cannot be loaded or the agent refuses to start.
    pub async fn start(
        case_store: &dyn CaseStore,
        agent: Arc<dyn AgentService>,
        history: Arc<dyn HistorySink>,
        case_id: &str,
        options: StartOptions,
    ) -> Result<Self> {
        let case = case_store.get_case(case_id).await?;

        let request = StartSessionRequest {
            case_id: case_id.to_string(),
            lazy_init: Some(options.lazy_init),
            skip_tts: Some(options.skip_tts),
            user_action: options.opening_action,
        };
        let response = agent.start_session(&request).await?;

        let session_id = response
            .session_id
            .or_else(|| response.state.as_ref().and_then(|s| s.session_id.clone()));

        let mut controller = Self {
            agent,
            history,
            credential: options.credential,
            case_id: case_id.to_string(),
            case,
            session_id,
            state: None,
            sequencer: EventSequencer::new(),
            aggregator: ScoreAggregator::new(),
            recorder: HistoryRecorder::new(),
            transcript: Transcript::new(),
        };

        if let Some(state) = response.state {
            controller.sequencer.on_session_start(&state);
            controller.rebuild_transcript(&state);
            controller.state = Some(state);
        }

        tracing::info!(
            case_id,
            session_id = controller.session_id.as_deref().unwrap_or("-"),
            current_event = controller.sequencer.current_event().unwrap_or("-"),
            "session started"
        );

        controller.finalize().await;
        Ok(controller)
    }

    /// Submit one trainee action and fold the agent's response in.
    pub async fn submit(&mut self, input: &str) -> TurnOutcome {
        if input.trim().is_empty() || self.is_finished() {
            return TurnOutcome::Ignored;
        }
        let Some(session_id) = self.session_id.clone() else {
            return TurnOutcome::Ignored;
        };

        self.transcript.push_user(input);

        let request = TurnRequest {
            session_id: session_id.clone(),
            user_input: input.to_string(),
        };
        let response = match self.agent.submit_turn(&session_id, &request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "turn failed");
                self.transcript.push_system_error(&e);
                return TurnOutcome::Failed(e.to_string());
            }
        };

        let Some(state) = response.state else {
            tracing::warn!(session_id = %session_id, "agent response carried no state");
            return TurnOutcome::Unchanged;
        };

        let event_for_score = self.sequencer.on_turn_result(&state);
        let last_score = state.last_score();
        let attributed = self.aggregator.record_turn(
            event_for_score.as_deref(),
            last_score,
            state.detail_scores(),
        );
        self.rebuild_transcript(&state);
        self.state = Some(state);

        let termination = self.termination();
        if let Some(reason) = termination {
            let result = self.result();
            tracing::info!(
                session_id = %session_id,
                reason = ?reason,
                final_score = result.final_score,
                is_success = result.is_success,
                "session finished"
            );
        }
        let finalize = self.finalize().await;

        TurnOutcome::Advanced(TurnReport {
            event_for_score,
            last_score,
            attributed,
            termination,
            finalize,
        })
    }

    async fn finalize(&mut self) -> FinalizeOutcome {
        let is_finished = self.is_finished();
        let session_id = self.session_id.clone();
        let case_id = &self.case_id;
        let transcript = &self.transcript;
        let state = &self.state;
        let aggregator = &self.aggregator;

        self.recorder
            .finalize(
                is_finished,
                session_id.as_deref(),
                self.credential.as_ref(),
                self.history.as_ref(),
                |session_id| HistoryRecord {
                    session_id: session_id.to_string(),
                    case_id: case_id.clone(),
                    messages: transcript.messages().to_vec(),
                    final_score: aggregator.compute_result().final_score,
                    final_state: final_state_snapshot(state.as_ref(), aggregator.records()),
                },
            )
            .await
    }

    fn rebuild_transcript(&mut self, state: &SessionState) {
        if !state.dialogue_history.is_empty() {
            self.transcript
                .replace_from_dialogue(&state.dialogue_history, &state.active_personas);
        }
    }

    /// Why the session ended, or `None` while it is running.
    pub fn termination(&self) -> Option<Termination> {
        self.state
            .as_ref()
            .and_then(|state| termination(&self.case.skeleton, state))
    }

    pub fn is_finished(&self) -> bool {
        self.termination().is_some()
    }

    /// Score summary over the events attributed so far.
    pub fn result(&self) -> SessionResult {
        self.aggregator.compute_result()
    }

    pub fn event_scores(&self) -> &BTreeMap<String, EventScoreRecord> {
        self.aggregator.records()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn case(&self) -> &CaseBundle {
        &self.case
    }

    pub fn current_event(&self) -> Option<&str> {
        self.sequencer.current_event()
    }

    pub fn recorder_phase(&self) -> RecorderPhase {
        self.recorder.phase()
    }
}

/// The agent's last state with the per-event breakdown embedded.
fn final_state_snapshot(
    state: Option<&SessionState>,
    records: &BTreeMap<String, EventScoreRecord>,
) -> Value {
    let mut snapshot = match state.map(serde_json::to_value) {
        Some(Ok(Value::Object(map))) => map,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "could not serialize final state");
            serde_json::Map::new()
        }
        _ => serde_json::Map::new(),
    };
    let breakdown = serde_json::to_value(records).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not serialize event scores");
        Value::Object(serde_json::Map::new())
    });
    snapshot.insert(EVENT_SCORES_KEY.to_string(), breakdown);
    Value::Object(snapshot)
}
