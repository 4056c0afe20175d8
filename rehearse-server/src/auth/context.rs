//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// The caller behind a validated bearer token.
///
/// Inserted into request extensions by [`crate::middleware::require_auth`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}
