//! rehearse-server - case store and session history service
//!
//! This crate serves the case documents a session is played against and the
//! per-user history records written when a session finishes. History routes
//! require a bearer token signed with the account service's shared secret.

mod error;
mod state;

pub mod auth;
pub mod http;
pub mod middleware;
pub mod storage;

use std::sync::Arc;

use tokio::net::TcpListener;

pub use auth::{Identity, TokenValidator};
pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;
pub use storage::TursoStorage;

/// The rehearse store server
pub struct RehearseServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl RehearseServer {
    /// Open the configured database and build the server
    pub async fn open(
        config: ServerConfig,
        validator: TokenValidator,
    ) -> Result<Self, ServerError> {
        let storage = TursoStorage::open(config.database.as_deref()).await?;
        match &config.database {
            Some(path) => tracing::info!("using database {}", path.display()),
            None => tracing::warn!("no database configured, history is kept in memory"),
        }
        let state = Arc::new(AppState::new(storage, validator));
        Ok(Self { config, state })
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("rehearse server listening on {}", addr);
        self.run_with_listener(listener).await
    }

    /// Run the server on an already-bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let router = create_router(self.state);
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Database file; in-memory when unset
    pub database: Option<std::path::PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database: None,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            database: None,
        }
    }

    /// Use a database file
    pub fn with_database(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.database = Some(path.into());
        self
    }

    /// Returns the socket address string (e.g., "127.0.0.1:8000")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::http::HeaderValue;
    use secrecy::SecretString;

    use crate::auth::{DEFAULT_TOKEN_TTL, Identity, TokenValidator};
    use crate::{AppState, TursoStorage};

    pub const TEST_SECRET: &str = "test-secret";

    pub async fn test_state() -> Arc<AppState> {
        let storage = TursoStorage::new_memory().await.unwrap();
        let validator = TokenValidator::new(&SecretString::from(TEST_SECRET.to_string()));
        Arc::new(AppState::new(storage, validator))
    }

    pub fn token_for(state: &AppState, user_id: &str) -> String {
        let identity = Identity::new(user_id, format!("{}@example.com", user_id));
        state.validator.issue(&identity, DEFAULT_TOKEN_TTL).unwrap()
    }

    pub fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }
}
