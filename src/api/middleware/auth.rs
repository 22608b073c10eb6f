use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use ring::hmac;
use secrecy::ExposeSecret;

use crate::api::state::AppState;
use crate::error::AppError;

/// Middleware that requires `Authorization: Bearer <notification_token>` when a
/// token is configured. Without a configured token every request passes.
pub async fn require_notification_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = &state.config.notification_token {
        let authorized = bearer_token(request.headers())
            .map(|presented| tokens_match(presented, expected.expose_secret()))
            .unwrap_or(false);

        if !authorized {
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// Extracts the credentials of a `Bearer` authorization header; the scheme is
/// matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if scheme.eq_ignore_ascii_case("Bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// Constant-time comparison: the presented token is checked against an HMAC
/// tag of the expected one.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let key = hmac::Key::new(hmac::HMAC_SHA256, expected.as_bytes());
    let tag = hmac::sign(&key, expected.as_bytes());
    hmac::verify(&key, presented.as_bytes(), tag.as_ref()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("BEARER  abc ")), Some("abc"));
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        assert_eq!(bearer_token(&headers("Basic YWxhZGRpbjpvcGVu")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("let-me-in", "let-me-in"));
        assert!(!tokens_match("let-me-i", "let-me-in"));
        assert!(!tokens_match("let-me-in!", "let-me-in"));
        assert!(!tokens_match("", "let-me-in"));
    }
}
