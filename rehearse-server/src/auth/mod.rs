//! Bearer token authentication.
//!
//! Tokens are minted by the account service with a shared HS256 secret and
//! carry `{ userId, email, exp }`. The server only validates them.

mod context;
mod error;
mod validator;

pub use context::Identity;
pub use error::AuthError;
pub use validator::{Claims, DEFAULT_TOKEN_TTL, TokenValidator};
