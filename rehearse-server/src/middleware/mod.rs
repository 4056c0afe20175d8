//! HTTP middleware

mod auth;

pub use auth::{bearer_token, require_auth};
