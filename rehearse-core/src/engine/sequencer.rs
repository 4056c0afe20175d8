//! Event progression and termination detection.
//!
//! Scores are reported one turn in arrears: the `last_score` on a turn's
//! response belongs to the event that was current when the trainee acted.
//! The sequencer keeps that event in an explicit slot so the attribution
//! never depends on timing.

use serde::{Deserialize, Serialize};

use crate::case::Skeleton;
use crate::state::SessionState;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The agent cleared `current_event`.
    AgentConcluded,
    /// The last canon event is marked `"pass"` in the event summary.
    LastEventPassed,
}

/// Two-slot buffer of the previous and current canon event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSequencer {
    previous_event: Option<String>,
    current_event: Option<String>,
}

impl EventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the buffer from the session-start response.
    pub fn on_session_start(&mut self, initial: &SessionState) {
        self.previous_event = initial.current_event.clone();
        self.current_event = initial.current_event.clone();
    }

    /// Advance after a turn response.
    ///
    /// Returns the event the response's score applies to, i.e. the event that
    /// was current before this turn.
    pub fn on_turn_result(&mut self, new_state: &SessionState) -> Option<String> {
        let event_for_score = self.previous_event.take();
        self.previous_event = new_state.current_event.clone();
        self.current_event = new_state.current_event.clone();
        event_for_score
    }

    pub fn previous_event(&self) -> Option<&str> {
        self.previous_event.as_deref()
    }

    pub fn current_event(&self) -> Option<&str> {
        self.current_event.as_deref()
    }
}

/// Decide whether a session has ended, and why.
///
/// Both signals are authoritative: an absent `current_event`, or the last
/// canon event (by array position) marked `"pass"`. Rule (b) never fires when
/// the summary is missing or the skeleton is empty.
pub fn termination(skeleton: &Skeleton, state: &SessionState) -> Option<Termination> {
    if state.current_event.is_none() {
        return Some(Termination::AgentConcluded);
    }

    let summary = state.event_summary.as_ref()?;
    let last_event = skeleton.last_event_id()?;
    summary
        .is_passed(last_event)
        .then_some(Termination::LastEventPassed)
}

/// Returns true if the session has ended.
pub fn is_finished(skeleton: &Skeleton, state: &SessionState) -> bool {
    termination(skeleton, state).is_some()
}
