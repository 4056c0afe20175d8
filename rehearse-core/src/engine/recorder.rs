//! One-shot persistence of a finished session.

use serde::{Deserialize, Serialize};

use crate::auth::Credential;
use crate::history::{HistoryRecord, StoredHistory};
use crate::traits::HistorySink;

/// Lifecycle of a session relative to its history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderPhase {
    #[default]
    Running,
    /// Finished and latched; the save request is in flight.
    PendingSave,
    Saved,
    /// The single save attempt failed. No retry is made.
    SaveFailed,
    /// Finished without a credential. Nothing is stored.
    Unrecorded,
}

/// What a call to [`HistoryRecorder::finalize`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    NotFinished,
    /// A previous call already claimed the save.
    AlreadyLatched,
    /// The session never received an id from the agent.
    MissingSession,
    Anonymous,
    Saved(StoredHistory),
    Failed(String),
}

/// Guards the at-most-once history write.
///
/// The latch is set before the credential check and before any I/O, so an
/// anonymous or failed session is never written later in its lifetime.
#[derive(Debug, Clone, Default)]
pub struct HistoryRecorder {
    already_saved: bool,
    phase: RecorderPhase,
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RecorderPhase {
        self.phase
    }

    pub fn is_latched(&self) -> bool {
        self.already_saved
    }

    /// Persist the session once it has finished.
    ///
    /// `build` is only invoked when a save is actually attempted.
    pub async fn finalize<F>(
        &mut self,
        is_finished: bool,
        session_id: Option<&str>,
        credential: Option<&Credential>,
        sink: &dyn HistorySink,
        build: F,
    ) -> FinalizeOutcome
    where
        F: FnOnce(&str) -> HistoryRecord,
    {
        if !is_finished {
            return FinalizeOutcome::NotFinished;
        }
        if self.already_saved {
            return FinalizeOutcome::AlreadyLatched;
        }
        let Some(session_id) = session_id else {
            return FinalizeOutcome::MissingSession;
        };

        self.already_saved = true;

        let Some(credential) = credential else {
            tracing::debug!(session_id, "no credential, session history not recorded");
            self.phase = RecorderPhase::Unrecorded;
            return FinalizeOutcome::Anonymous;
        };

        self.phase = RecorderPhase::PendingSave;
        let record = build(session_id);

        match sink.save(credential, &record).await {
            Ok(stored) => {
                tracing::info!(
                    session_id,
                    final_score = record.final_score,
                    "session history saved"
                );
                self.phase = RecorderPhase::Saved;
                FinalizeOutcome::Saved(stored)
            }
            Err(e) => {
                tracing::warn!(session_id, error = %e, "failed to save session history");
                self.phase = RecorderPhase::SaveFailed;
                FinalizeOutcome::Failed(e.to_string())
            }
        }
    }
}
