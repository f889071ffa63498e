//! HTTP API integration tests
//!
//! The router is driven with `tower::ServiceExt::oneshot`, so no socket is
//! bound. Mail goes to an in-memory transport and every request shares the
//! "unknown" rate limit key.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ara_email_service::config::Settings;
use ara_email_service::locale::LocaleStore;
use ara_email_service::mail::{MailTransport, MemoryTransport};
use ara_email_service::server::{create_app, AppState};
use ara_email_service::template::{EmailRenderer, TemplateConfig};

const API_KEY: &str = "test-api-key";

fn asset(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(path)
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.api.key = Some(API_KEY.to_string());
    settings.smtp.transport = "memory".to_string();
    settings
}

fn build_app(settings: Settings, mailer: Arc<MemoryTransport>) -> Router {
    let store = Arc::new(LocaleStore::load(asset("locales")).unwrap());
    let renderer = Arc::new(
        EmailRenderer::new(
            TemplateConfig::new(asset("templates")),
            store,
            Some("cid:logo".to_string()),
        )
        .unwrap(),
    );
    let mailer: Arc<dyn MailTransport> = mailer;
    create_app(AppState::new(settings, renderer, mailer))
}

fn test_app() -> (Router, Arc<MemoryTransport>) {
    let mailer = Arc::new(MemoryTransport::new());
    (build_app(test_settings(), mailer.clone()), mailer)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn header_str<'a>(response: &'a Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_missing_authorization_header() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/email/welcome")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"to":["ava@example.com"]}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], "Authorization header is missing");
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/email/welcome")
        .header(header::AUTHORIZATION, format!("Token {}", API_KEY))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["error"]["message"],
        "Invalid authorization format. Use: Bearer <token>"
    );
}

#[tokio::test]
async fn test_wrong_api_key() {
    let (app, mailer) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/email/welcome")
        .header(header::AUTHORIZATION, "Bearer nope")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"to":["ava@example.com"]}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["message"], "Invalid API key");
    assert!(mailer.is_empty());
}

#[tokio::test]
async fn test_unset_api_key_rejects_every_token() {
    let mut settings = test_settings();
    settings.api.key = None;
    let app = build_app(settings, Arc::new(MemoryTransport::new()));

    let response = app
        .oneshot(post_json("/api/email/welcome", json!({"to": ["ava@example.com"]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Sending
// =============================================================================

#[tokio::test]
async fn test_send_email_success() {
    let (app, mailer) = test_app();
    let response = app
        .oneshot(post_json(
            "/api/email/welcome",
            json!({
                "to": ["ava@example.com"],
                "locale": "en",
                "data": {"name": "Ava"},
                "meta": {"reply_to": "support@example.com", "cc": ["ops@example.com"]}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email sent successfully");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(body["data"]["message_id"], sent[0].message_id.as_str());

    let email = &sent[0].email;
    assert_eq!(email.to, vec!["ava@example.com".to_string()]);
    assert_eq!(email.subject, "Welcome to Ara Travel");
    assert_eq!(email.reply_to.as_deref(), Some("support@example.com"));
    assert_eq!(email.cc, vec!["ops@example.com".to_string()]);
    assert!(email.html.contains("Dear Ava,"));
}

#[tokio::test]
async fn test_send_email_defaults_to_turkish() {
    let (app, mailer) = test_app();
    let response = app
        .oneshot(post_json(
            "/api/email/hotel-reservation",
            json!({"to": ["ava@example.com"], "data": {"customerName": "Ava"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let sent = mailer.sent();
    assert_eq!(sent[0].email.subject, "Otel rezervasyonunuz");
    assert!(sent[0].email.html.contains("Sayın Ava,"));
}

#[tokio::test]
async fn test_explicit_subject_wins() {
    let (app, mailer) = test_app();
    app.oneshot(post_json(
        "/api/email/welcome",
        json!({"to": ["ava@example.com"], "locale": "en", "subject": "Custom subject"}),
    ))
    .await
    .unwrap();

    assert_eq!(mailer.sent()[0].email.subject, "Custom subject");
}

#[tokio::test]
async fn test_unknown_template_is_not_implemented() {
    let (app, mailer) = test_app();
    let response = app
        .oneshot(post_json("/api/email/invoice", json!({"to": ["ava@example.com"]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NOT_IMPLEMENTED");
    assert_eq!(body["error"]["message"], "Template not configured: invoice");
    assert!(mailer.is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_server_error() {
    let app = build_app(test_settings(), Arc::new(MemoryTransport::failing("relay down")));
    let response = app
        .oneshot(post_json("/api/email/welcome", json!({"to": ["ava@example.com"]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"]["code"], "MAIL_ERROR");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_empty_recipient_list() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json("/api/email/welcome", json!({"to": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Validation failed");
    assert_eq!(body["error"]["details"][0]["path"], json!(["to"]));
    assert_eq!(
        body["error"]["details"][0]["message"],
        "At least one recipient is required"
    );
}

#[tokio::test]
async fn test_invalid_addresses_are_reported_by_path() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json(
            "/api/email/welcome",
            json!({"to": ["ava@example.com", "nope"], "meta": {"bcc": ["also-nope"]}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let details = json_body(response).await["error"]["details"].clone();
    assert_eq!(details[0]["path"], json!(["to", 1]));
    assert_eq!(details[1]["path"], json!(["meta", "bcc", 0]));
}

#[tokio::test]
async fn test_missing_recipients_field() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json("/api/email/welcome", json!({"locale": "en"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/email/welcome")
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_rate_limit_headers_and_denial() {
    let mut settings = test_settings();
    settings.ratelimit.requests = 2;
    settings.ratelimit.window = 60;
    let app = build_app(settings, Arc::new(MemoryTransport::new()));

    let first = app
        .clone()
        .oneshot(post_json("/api/templates/cache/clear", json!({})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header_str(&first, "x-ratelimit-limit"), "2");
    assert_eq!(header_str(&first, "x-ratelimit-remaining"), "1");

    let second = app
        .clone()
        .oneshot(post_json("/api/templates/cache/clear", json!({})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let third = app
        .oneshot(post_json("/api/templates/cache/clear", json!({})))
        .await
        .unwrap();
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_str(&third, "x-ratelimit-remaining"), "0");
    assert!(!header_str(&third, "retry-after").is_empty());
    assert_eq!(
        json_body(third).await["error"]["message"],
        "Too Many Requests. Please try again later."
    );
}

#[tokio::test]
async fn test_public_routes_are_not_rate_limited() {
    let mut settings = test_settings();
    settings.ratelimit.requests = 1;
    let app = build_app(settings, Arc::new(MemoryTransport::new()));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// =============================================================================
// Operational endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["mail"]["transport"], "memory");
    assert_eq!(body["templates"]["partials"], 3);
    assert_eq!(body["ratelimit"]["limit"], 30);
}

#[tokio::test]
async fn test_cache_clear() {
    let (app, _) = test_app();
    let response = app
        .oneshot(post_json("/api/templates/cache/clear", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["partials"], 3);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(header_str(&response, "content-type").starts_with("text/plain"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(header_str(&response, "x-request-id"), "req-123");
}

#[tokio::test]
async fn test_oversized_body_is_rejected_with_request_id() {
    let mut settings = test_settings();
    settings.server.body_limit_bytes = 64;
    let app = build_app(settings, Arc::new(MemoryTransport::new()));

    let body = json!({"to": ["ava@example.com"], "data": {"name": "x".repeat(256)}}).to_string();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/email/welcome")
                .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .header("x-request-id", "req-413")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(header_str(&response, "x-request-id"), "req-413");
}
