//! Shared application state for the rehearse server

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::TokenValidator;
use crate::storage::{CaseStorage, HistoryStorage, TursoStorage};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Session history records
    pub histories: Arc<dyn HistoryStorage>,
    /// Case documents
    pub cases: Arc<dyn CaseStorage>,
    /// Bearer token validator
    pub validator: Arc<TokenValidator>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state backed by one Turso database for both histories and cases
    pub fn new(storage: TursoStorage, validator: TokenValidator) -> Self {
        let storage = Arc::new(storage);
        Self::with_components(storage.clone(), storage, Arc::new(validator))
    }

    /// Create AppState with custom components (for testing)
    pub fn with_components(
        histories: Arc<dyn HistoryStorage>,
        cases: Arc<dyn CaseStorage>,
        validator: Arc<TokenValidator>,
    ) -> Self {
        Self {
            histories,
            cases,
            validator,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
