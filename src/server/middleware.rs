use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::metrics::RateLimitMetrics;
use crate::ratelimit::RateLimitResult;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id stored in request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Assign every request an id, reusing a sane inbound `x-request-id`.
///
/// The id is echoed on the response.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).await;
    if let Ok(v) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    response
}

/// Bearer token authentication middleware.
/// Validates `Authorization: Bearer <token>` against the configured api.key
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(header_value) = req.headers().get(header::AUTHORIZATION) else {
        tracing::warn!("Missing authorization header");
        return Err(AppError::Auth("Authorization header is missing".to_string()));
    };

    let Some(token) = header_value.to_str().ok().and_then(extract_bearer_token) else {
        tracing::warn!("Malformed authorization header");
        return Err(AppError::Auth(
            "Invalid authorization format. Use: Bearer <token>".to_string(),
        ));
    };

    match state.settings.api.key.as_deref() {
        Some(expected) if api_key_matches(expected, token) => Ok(next.run(req).await),
        _ => {
            tracing::warn!("Invalid API key provided");
            Err(AppError::Auth("Invalid API key".to_string()))
        }
    }
}

/// Constant-time comparison; an empty configured key never matches
fn api_key_matches(expected: &str, token: &str) -> bool {
    !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(token.as_bytes()))
}

/// Token of a `Bearer <token>` header value
pub fn extract_bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme == "Bearer" && !token.is_empty()).then_some(token)
}

/// Rate limit key for a request: the peer IP when known
fn client_key(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware for HTTP API requests.
///
/// Uses the client IP address as the rate limit key.
/// Returns 429 Too Many Requests with Retry-After header when rate limited.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // Skip if rate limiting is disabled
    if !state.rate_limiter.is_enabled() {
        return next.run(req).await;
    }

    let client = client_key(&req);

    match state.rate_limiter.check(&client) {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset_at,
        } => {
            RateLimitMetrics::record_allowed();
            let mut response = next.run(req).await;
            insert_rate_limit_headers(response.headers_mut(), limit, remaining, reset_at);
            response
        }
        RateLimitResult::Denied {
            retry_after,
            limit,
            reset_at,
        } => {
            RateLimitMetrics::record_denied();
            tracing::warn!(
                client = %client,
                retry_after = retry_after,
                "Rate limit exceeded"
            );

            let mut response =
                AppError::RateLimited("Too Many Requests. Please try again later.".to_string())
                    .into_response();
            let headers = response.headers_mut();
            insert_rate_limit_headers(headers, limit, 0, reset_at);
            if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
                headers.insert(header::RETRY_AFTER, v);
            }
            response
        }
    }
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_at: i64) {
    for (name, value) in [
        ("x-ratelimit-limit", limit.to_string()),
        ("x-ratelimit-remaining", remaining.to_string()),
        ("x-ratelimit-reset", reset_at.to_string()),
    ] {
        if let Ok(v) = HeaderValue::from_str(&value) {
            headers.insert(name, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("bearer abc"), None);
        assert_eq!(extract_bearer_token("Bearer"), None);
    }

    #[test]
    fn test_api_key_matches() {
        assert!(api_key_matches("secret-key", "secret-key"));
        assert!(!api_key_matches("secret-key", "secret-kez"));
        assert!(!api_key_matches("secret-key", "secret"));
        assert!(!api_key_matches("secret-key", "secret-key-longer"));
        assert!(!api_key_matches("", ""));
    }

    #[test]
    fn test_client_key_without_connect_info() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&req), "unknown");

        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 4000))));
        assert_eq!(client_key(&req), "10.1.2.3");
    }
}
