//! Per-event score accumulation and the final session result.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::CriterionScore;

/// Fixed rubric ceiling shown alongside the final score.
pub const MAX_SCORE: u32 = 5;

/// Minimum final score for a successful session.
pub const PASS_THRESHOLD: f64 = 3.0;

/// Accumulated scoring for one canon event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventScoreRecord {
    pub event_id: String,
    /// Sum of every score attributed to this event, retries included.
    pub score: f64,
    /// Per-criterion detail, concatenated across attributions.
    pub scores: Vec<CriterionScore>,
    pub timestamp: DateTime<Utc>,
}

/// Outcome computed once a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub final_score: f64,
    pub max_score: u32,
    pub is_success: bool,
    pub event_count: usize,
}

/// Folds per-turn score attributions into per-event and total accumulators.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    records: BTreeMap<String, EventScoreRecord>,
    cumulative_score: f64,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute one turn's score to an event.
    ///
    /// Returns false without touching any state when either the event or the
    /// score is absent.
    pub fn record_turn(
        &mut self,
        event_for_score: Option<&str>,
        last_score: Option<f64>,
        detail_scores: &[CriterionScore],
    ) -> bool {
        let (Some(event_id), Some(score)) = (event_for_score, last_score) else {
            return false;
        };
        if score == 0.0 {
            return false;
        }

        self.cumulative_score += score;
        let now = Utc::now();

        self.records
            .entry(event_id.to_string())
            .and_modify(|record| {
                record.score += score;
                record.scores.extend_from_slice(detail_scores);
                record.timestamp = now;
            })
            .or_insert_with(|| EventScoreRecord {
                event_id: event_id.to_string(),
                score,
                scores: detail_scores.to_vec(),
                timestamp: now,
            });

        tracing::debug!(event_id, score, "attributed score to event");
        true
    }

    /// Records keyed by event id.
    pub fn records(&self) -> &BTreeMap<String, EventScoreRecord> {
        &self.records
    }

    pub fn record(&self, event_id: &str) -> Option<&EventScoreRecord> {
        self.records.get(event_id)
    }

    /// Running total of every attributed score.
    pub fn cumulative_score(&self) -> f64 {
        self.cumulative_score
    }

    /// Number of distinct events scored at least once.
    pub fn event_count(&self) -> usize {
        self.records.len()
    }

    pub fn compute_result(&self) -> SessionResult {
        compute_result(&self.records)
    }
}

/// Average the per-event cumulative totals into a final score.
///
/// A retried event contributes its summed score as a single data point, so
/// the result can exceed [`MAX_SCORE`].
pub fn compute_result(records: &BTreeMap<String, EventScoreRecord>) -> SessionResult {
    let event_count = records.len();
    let final_score = if event_count > 0 {
        let total: f64 = records.values().map(|r| r.score).sum();
        round_one_decimal(total / event_count as f64)
    } else {
        0.0
    };

    SessionResult {
        final_score,
        max_score: MAX_SCORE,
        is_success: final_score >= PASS_THRESHOLD,
        event_count,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
