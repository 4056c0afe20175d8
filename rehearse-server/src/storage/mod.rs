//! Storage for session histories and case documents.
//!
//! - [`HistoryStorage`] - per-user session history, upserted by session id
//! - [`CaseStorage`] - case skeletons, contexts and personas
//!
//! [`TursoStorage`] implements both on libSQL.

mod error;
mod turso;

pub use error::{Error, Result};
pub use turso::TursoStorage;

use async_trait::async_trait;
use rehearse_core::{CaseSummary, StoredHistory};
use serde_json::Value;

/// Fields written by a history upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryUpsert {
    pub session_id: String,
    pub case_id: String,
    pub messages: Vec<Value>,
    pub final_score: f64,
    pub final_state: Value,
}

/// A case as stored: three opaque JSON documents keyed by case id.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseDocument {
    pub case_id: String,
    pub skeleton: Value,
    pub context: Value,
    pub personas: Value,
}

impl CaseDocument {
    /// Topic shown in case listings.
    pub fn topic(&self) -> Option<String> {
        self.context
            .get("topic")
            .or_else(|| self.context.pointer("/initial_context/topic"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Number of entries in `personas.personas`.
    pub fn personas_count(&self) -> usize {
        self.personas
            .get("personas")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            case_id: self.case_id.clone(),
            topic: self.topic(),
        }
    }
}

/// Session history persistence, scoped by owner.
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// Insert or overwrite the record for `entry.session_id`.
    ///
    /// Returns [`Error::Forbidden`] if the record belongs to another user.
    async fn upsert_history(&self, user_id: &str, entry: &HistoryUpsert) -> Result<StoredHistory>;

    /// Records owned by `user_id`, most recent first.
    async fn list_histories(&self, user_id: &str) -> Result<Vec<StoredHistory>>;

    async fn get_history(&self, user_id: &str, session_id: &str) -> Result<Option<StoredHistory>>;
}

/// Case document persistence.
#[async_trait]
pub trait CaseStorage: Send + Sync {
    async fn list_cases(&self) -> Result<Vec<CaseSummary>>;

    async fn get_case(&self, case_id: &str) -> Result<Option<CaseDocument>>;

    async fn upsert_case(&self, case: &CaseDocument) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(context: Value, personas: Value) -> CaseDocument {
        CaseDocument {
            case_id: "case-1".to_string(),
            skeleton: json!({}),
            context,
            personas,
        }
    }

    #[test]
    fn topic_reads_context_or_initial_context() {
        assert_eq!(
            document(json!({"topic": "Triage"}), Value::Null)
                .topic()
                .as_deref(),
            Some("Triage")
        );
        let nested = json!({"initial_context": {"topic": "Fire drill"}});
        assert_eq!(
            document(nested, Value::Null).topic().as_deref(),
            Some("Fire drill")
        );
        assert_eq!(document(json!({}), Value::Null).topic(), None);
    }

    #[test]
    fn personas_count_requires_array() {
        let doc = document(json!({}), json!({"personas": [{"id": "p1"}, {"id": "p2"}]}));
        assert_eq!(doc.personas_count(), 2);
        let not_array = document(json!({}), json!({"personas": "x"}));
        assert_eq!(not_array.personas_count(), 0);
        assert_eq!(document(json!({}), Value::Null).personas_count(), 0);
    }
}
