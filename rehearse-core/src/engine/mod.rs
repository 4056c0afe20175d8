//! Scoring and progression engine.
//!
//! - [`sequencer`] tracks which canon event a score belongs to and detects
//!   the end of a session
//! - [`aggregator`] folds attributed scores into per-event records and the
//!   final result
//! - [`recorder`] writes the finished session to the history store once

pub mod aggregator;
pub mod recorder;
pub mod sequencer;

pub use aggregator::{
    EventScoreRecord, MAX_SCORE, PASS_THRESHOLD, ScoreAggregator, SessionResult, compute_result,
};
pub use recorder::{FinalizeOutcome, HistoryRecorder, RecorderPhase};
pub use sequencer::{EventSequencer, Termination, is_finished, termination};
