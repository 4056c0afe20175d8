//! Turso/libSQL implementation of history and case storage.
//!
//! Connects to a local embedded SQLite file, or an in-memory database for
//! tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Builder, Connection, Database};
use rehearse_core::{CaseSummary, StoredHistory};
use tracing::{debug, instrument};

use super::{CaseDocument, CaseStorage, Error, HistoryStorage, HistoryUpsert, Result};

/// SQL schema for the session history table.
const SCHEMA_HISTORIES: &str = r#"
CREATE TABLE IF NOT EXISTS session_histories (
    session_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    case_id TEXT NOT NULL,
    messages TEXT NOT NULL,
    final_score REAL NOT NULL,
    final_state TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const INDEX_HISTORIES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_session_histories_user_time
ON session_histories(user_id, created_at)
"#;

/// SQL schema for the case table.
const SCHEMA_CASES: &str = r#"
CREATE TABLE IF NOT EXISTS cases (
    case_id TEXT PRIMARY KEY,
    skeleton TEXT NOT NULL,
    context TEXT NOT NULL,
    personas TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const HISTORY_COLUMNS: &str =
    "session_id, user_id, case_id, messages, final_score, final_state, created_at, updated_at";

/// Turso-backed storage for histories and cases.
///
/// Holds one connection for its lifetime so an in-memory database keeps its
/// contents between calls.
#[derive(Clone)]
pub struct TursoStorage {
    _db: Arc<Database>,
    conn: Connection,
}

impl TursoStorage {
    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::init(db).await
    }

    /// Create an in-memory database (for testing and throwaway servers).
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::init(db).await
    }

    /// Open a file if a path is given, otherwise an in-memory database.
    pub async fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::new_local(path).await,
            None => Self::new_memory().await,
        }
    }

    async fn init(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        let storage = Self {
            _db: Arc::new(db),
            conn,
        };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Ensure the database schema exists.
    async fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute(SCHEMA_HISTORIES, ()).await?;
        conn.execute(INDEX_HISTORIES, ()).await?;
        conn.execute(SCHEMA_CASES, ()).await?;
        Ok(())
    }

    /// Parse a history record from a database row.
    fn parse_history(row: &libsql::Row) -> Result<StoredHistory> {
        let session_id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let case_id: String = row.get(2)?;
        let messages_json: String = row.get(3)?;
        let final_score: f64 = row.get(4)?;
        let final_state_json: String = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        let updated_at_str: String = row.get(7)?;

        Ok(StoredHistory {
            session_id,
            user_id,
            case_id,
            messages: serde_json::from_str(&messages_json)?,
            final_score,
            final_state: serde_json::from_str(&final_state_json)?,
            created_at: parse_datetime(&created_at_str)?,
            updated_at: parse_datetime(&updated_at_str)?,
        })
    }

    fn parse_case(row: &libsql::Row) -> Result<CaseDocument> {
        let case_id: String = row.get(0)?;
        let skeleton_json: String = row.get(1)?;
        let context_json: String = row.get(2)?;
        let personas_json: String = row.get(3)?;

        Ok(CaseDocument {
            case_id,
            skeleton: serde_json::from_str(&skeleton_json)?,
            context: serde_json::from_str(&context_json)?,
            personas: serde_json::from_str(&personas_json)?,
        })
    }
}

#[async_trait]
impl HistoryStorage for TursoStorage {
    #[instrument(skip(self, entry), fields(session_id = %entry.session_id), level = "debug")]
    async fn upsert_history(&self, user_id: &str, entry: &HistoryUpsert) -> Result<StoredHistory> {
        let now = format_datetime(Utc::now());
        let messages = serde_json::to_string(&entry.messages)?;
        let final_state = serde_json::to_string(&entry.final_state)?;
        let changed = self
            .conn()
            .execute(
                r#"
                INSERT INTO session_histories (session_id, user_id, case_id, messages, final_score, final_state, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(session_id) DO UPDATE SET
                    case_id = excluded.case_id,
                    messages = excluded.messages,
                    final_score = excluded.final_score,
                    final_state = excluded.final_state,
                    updated_at = excluded.updated_at
                WHERE session_histories.user_id = excluded.user_id
                "#,
                libsql::params![
                    entry.session_id.as_str(),
                    user_id,
                    entry.case_id.as_str(),
                    messages,
                    entry.final_score,
                    final_state,
                    now.as_str(),
                    now.as_str()
                ],
            )
            .await?;

        if changed == 0 {
            return Err(Error::Forbidden(entry.session_id.clone()));
        }
        debug!("history upserted");

        self.get_history(user_id, &entry.session_id)
            .await?
            .ok_or_else(|| Error::InvalidData(format!("history {} vanished", entry.session_id)))
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_histories(&self, user_id: &str) -> Result<Vec<StoredHistory>> {
        let sql = format!(
            "SELECT {} FROM session_histories WHERE user_id = ? ORDER BY created_at DESC, updated_at DESC, rowid DESC",
            HISTORY_COLUMNS
        );
        let mut rows = self.conn().query(&sql, [user_id]).await?;

        let mut histories = Vec::new();
        while let Some(row) = rows.next().await? {
            histories.push(Self::parse_history(&row)?);
        }
        Ok(histories)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_history(&self, user_id: &str, session_id: &str) -> Result<Option<StoredHistory>> {
        let sql = format!(
            "SELECT {} FROM session_histories WHERE session_id = ? AND user_id = ?",
            HISTORY_COLUMNS
        );
        let mut rows = self
            .conn()
            .query(&sql, libsql::params![session_id, user_id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_history(&row)?))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl CaseStorage for TursoStorage {
    #[instrument(skip(self), level = "debug")]
    async fn list_cases(&self) -> Result<Vec<CaseSummary>> {
        let mut rows = self
            .conn()
            .query(
                "SELECT case_id, skeleton, context, personas FROM cases ORDER BY case_id ASC",
                (),
            )
            .await?;

        let mut cases = Vec::new();
        while let Some(row) = rows.next().await? {
            cases.push(Self::parse_case(&row)?.summary());
        }
        Ok(cases)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_case(&self, case_id: &str) -> Result<Option<CaseDocument>> {
        let mut rows = self
            .conn()
            .query(
                "SELECT case_id, skeleton, context, personas FROM cases WHERE case_id = ?",
                [case_id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_case(&row)?))
        } else {
            Ok(None)
        }
    }

    #[instrument(skip(self, case), fields(case_id = %case.case_id), level = "debug")]
    async fn upsert_case(&self, case: &CaseDocument) -> Result<()> {
        let skeleton = serde_json::to_string(&case.skeleton)?;
        let context = serde_json::to_string(&case.context)?;
        let personas = serde_json::to_string(&case.personas)?;
        self.conn()
            .execute(
                r#"
                INSERT INTO cases (case_id, skeleton, context, personas, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(case_id) DO UPDATE SET
                    skeleton = excluded.skeleton,
                    context = excluded.context,
                    personas = excluded.personas,
                    updated_at = excluded.updated_at
                "#,
                libsql::params![
                    case.case_id.as_str(),
                    skeleton,
                    context,
                    personas,
                    format_datetime(Utc::now())
                ],
            )
            .await?;
        Ok(())
    }
}

/// Format a datetime for storage.
///
/// Fixed-width so that text ordering matches time ordering.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime from storage.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidData(format!("invalid datetime: {}", s)))
}
