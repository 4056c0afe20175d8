//! Case store client.

use async_trait::async_trait;

use super::{DEFAULT_STORE_URL, check_status, normalize_base_url};
use crate::case::{CaseBundle, CaseSummary};
use crate::traits::CaseStore;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct CaseClient {
    base_url: String,
    client: reqwest::Client,
}

impl CaseClient {
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
}

impl Default for CaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaseStore for CaseClient {
    async fn list_cases(&self) -> Result<Vec<CaseSummary>> {
        let url = format!("{}/api/cases", self.base_url);
        let response = check_status(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn get_case(&self, case_id: &str) -> Result<CaseBundle> {
        let url = format!("{}/api/cases/{}", self.base_url, case_id);
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::CaseNotFound(case_id.to_string()));
        }
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}
