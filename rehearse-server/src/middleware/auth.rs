//! Bearer authentication middleware for axum

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::auth::AuthError;
use crate::http::error_response;

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidHeader);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Reject requests without a valid bearer token
///
/// On success the caller's [`Identity`](crate::auth::Identity) is attached to
/// the request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let result = bearer_token(request.headers()).and_then(|t| state.validator.validate(t));
    let identity = match result {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!("authentication failed: {}", e);
            return error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string())
                .into_response();
        }
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn test_bearer_token_missing() {
        let empty = HeaderMap::new();
        let missing = bearer_token(&empty);
        assert!(matches!(missing, Err(AuthError::MissingToken)));
        assert!(matches!(
            bearer_token(&headers("Bearer  ")),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidHeader)
        ));
        assert!(matches!(
            bearer_token(&headers("token")),
            Err(AuthError::InvalidHeader)
        ));
    }
}
