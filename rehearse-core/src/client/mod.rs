//! HTTP clients for the agent service, the case store and the history store.
//!
//! # Example
//!
//! ```ignore
//! use rehearse_core::client::{AgentClient, CaseClient, HistoryClient};
//!
//! let agent = AgentClient::new();  // http://localhost:9000
//! let cases = CaseClient::with_base_url("http://localhost:8000");
//! let history = HistoryClient::with_base_url("http://localhost:8000");
//! ```

mod agent;
mod cases;
mod history;

pub use agent::AgentClient;
pub use cases::CaseClient;
pub use history::HistoryClient;

use crate::{Error, Result};

/// Default agent service base URL.
pub const DEFAULT_AGENT_URL: &str = "http://localhost:9000";

/// Default base URL of the case and history store.
pub const DEFAULT_STORE_URL: &str = "http://localhost:8000";

fn normalize_base_url(base_url: impl Into<String>) -> String {
    let mut base_url = base_url.into();
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

/// Turn a non-success response into [`Error::Api`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}
