//! History store client.

use async_trait::async_trait;

use super::{DEFAULT_STORE_URL, check_status, normalize_base_url};
use crate::Result;
use crate::auth::Credential;
use crate::history::{HistoryRecord, SaveHistoryResponse, StoredHistory};
use crate::traits::{HistoryReader, HistorySink};

/// Reads and writes session history with a bearer credential.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl HistoryClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_STORE_URL)
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

    fn history_url(&self) -> String {
        format!("{}/api/sessions/history", self.base_url)
    }
}

impl Default for HistoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistorySink for HistoryClient {
    async fn save(&self, credential: &Credential, record: &HistoryRecord) -> Result<StoredHistory> {
        let response = self
            .client
            .post(self.history_url())
            .bearer_auth(credential.expose_secret())
            .json(record)
            .send()
            .await?;
        let saved: SaveHistoryResponse = check_status(response).await?.json().await?;
        Ok(saved.history)
    }
}

#[async_trait]
impl HistoryReader for HistoryClient {
    async fn list(&self, credential: &Credential) -> Result<Vec<StoredHistory>> {
        let response = self
            .client
            .get(self.history_url())
            .bearer_auth(credential.expose_secret())
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn get(
        &self,
        credential: &Credential,
        session_id: &str,
    ) -> Result<Option<StoredHistory>> {
        let url = format!("{}/{}", self.history_url(), session_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.expose_secret())
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check_status(response).await?.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_url_uses_base() {
        let client = HistoryClient::with_base_url("http://store:8000/");
        assert_eq!(
            client.history_url(),
            "http://store:8000/api/sessions/history"
        );
    }
}
