//! Agent service client.

use async_trait::async_trait;

use super::{DEFAULT_AGENT_URL, check_status, normalize_base_url};
use crate::Result;
use crate::state::{StartSessionRequest, StartSessionResponse, TurnRequest, TurnResponse};
use crate::traits::AgentService;

/// Talks to the conversation and scoring agent over HTTP.
#[derive(Debug, Clone)]
pub struct AgentClient {
    base_url: String,
    client: reqwest::Client,
}

impl AgentClient {
    /// Create a client for the default URL (localhost:9000).
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_AGENT_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn sessions_url(&self) -> String {
        format!("{}/api/agent/sessions", self.base_url)
    }

    fn turn_url(&self, session_id: &str) -> String {
        format!("{}/api/agent/sessions/{}/turn", self.base_url, session_id)
    }
}

impl Default for AgentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentService for AgentClient {
    async fn start_session(&self, request: &StartSessionRequest) -> Result<StartSessionResponse> {
        let response = self
            .client
            .post(self.sessions_url())
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn submit_turn(&self, session_id: &str, request: &TurnRequest) -> Result<TurnResponse> {
        let response = self
            .client
            .post(self.turn_url(session_id))
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}
