//! Interfaces of the external collaborators the engine talks to.

use async_trait::async_trait;

use crate::Result;
use crate::auth::Credential;
use crate::case::{CaseBundle, CaseSummary};
use crate::history::{HistoryRecord, StoredHistory};
use crate::state::{StartSessionRequest, StartSessionResponse, TurnRequest, TurnResponse};

/// Black-box conversation and scoring service.
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Start a session; the agent assigns the first canon event.
    async fn start_session(&self, request: &StartSessionRequest) -> Result<StartSessionResponse>;

    /// Process one trainee action and return the updated state.
    async fn submit_turn(&self, session_id: &str, request: &TurnRequest) -> Result<TurnResponse>;
}

/// Read access to case documents.
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn list_cases(&self) -> Result<Vec<CaseSummary>>;

    /// Fetch a case bundle. Unknown ids yield [`crate::Error::CaseNotFound`].
    async fn get_case(&self, case_id: &str) -> Result<CaseBundle>;
}

/// Write side of the history store.
#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Upsert the record keyed by its session id.
    async fn save(&self, credential: &Credential, record: &HistoryRecord) -> Result<StoredHistory>;
}

/// Read side of the history store, scoped to the credential's owner.
#[async_trait]
pub trait HistoryReader: Send + Sync {
    /// The caller's records, most recent first.
    async fn list(&self, credential: &Credential) -> Result<Vec<StoredHistory>>;

    /// One record, or `None` if missing or owned by someone else.
    async fn get(&self, credential: &Credential, id: &str) -> Result<Option<StoredHistory>>;
}
