//! HTTP API integration tests
//!
//! Drive the axum router directly with `oneshot`, no listener needed.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use condo_mail_notifications::config::Settings;
use condo_mail_notifications::server::{create_app, AppState};
use condo_mail_notifications::template::MemoryTemplateBackend;

fn create_test_app(api_key: Option<&str>) -> Router {
    let mut settings = Settings::default();
    settings.api.key = api_key.map(str::to_string);

    let state = AppState::new(settings, Arc::new(MemoryTemplateBackend::new()), None);
    create_app(state)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn test_health_reports_memory_backend() {
    let app = create_test_app(None);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"]["backend"], "memory");
}

#[tokio::test]
async fn test_save_then_resolve() {
    let app = create_test_app(None);

    let (status, saved) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/condos/condo-1/templates/arrival",
            json!({
                "title": "Chegada",
                "content": "Protocol: {PROTOCOLO}, Arrived {DATA_HORA}"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["id"], "condo-1_ARRIVAL");
    assert_eq!(saved["isActive"], true);

    let (status, rendered) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/condos/condo-1/messages/ARRIVAL",
            json!({
                "variables": {"PROTOCOLO": 123456, "DATA_HORA": "01/01/2025 10:00"}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rendered["message"], "Protocol: 123456, Arrived 01/01/2025 10:00");
    assert_eq!(rendered["source"], "custom");
    assert_eq!(rendered["unresolved"], json!([]));
}

#[tokio::test]
async fn test_resolve_unknown_category_is_not_an_error() {
    let app = create_test_app(None);

    let (status, rendered) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/condos/condo-1/messages/NOT_A_CATEGORY",
            json!({"variables": {"MORADOR": "Ana"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rendered["source"], "fallback");
    assert!(rendered["message"].as_str().unwrap().contains("Ana"));
}

#[tokio::test]
async fn test_resolve_without_body_uses_default() {
    let app = create_test_app(None);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/condos/condo-1/messages/ARRIVAL")
        .body(Body::empty())
        .unwrap();

    let (status, rendered) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rendered["source"], "default");
    assert!(rendered["message"].as_str().unwrap().contains("{MORADOR}"));
}

#[tokio::test]
async fn test_save_unknown_category_is_rejected() {
    let app = create_test_app(None);

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/condos/condo-1/templates/BIRTHDAY",
            json!({"title": "t", "content": "c"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_mandatory_template_requires_manager() {
    let app = create_test_app(None);

    let mut lock = json_request(
        Method::PUT,
        "/api/v1/condos/condo-1/templates/PICKUP",
        json!({"title": "Oficial", "content": "official", "isMandatory": true}),
    );
    lock.headers_mut()
        .insert("X-Operator-Role", "ADMIN".parse().unwrap());
    let (status, saved) = send(&app, lock).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["isMandatory"], true);

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/condos/condo-1/templates/PICKUP",
            json!({"title": "Meu", "content": "mine"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "TEMPLATE_LOCKED");

    let list = Request::builder()
        .uri("/api/v1/condos/condo-1/templates")
        .body(Body::empty())
        .unwrap();
    let (status, listed) = send(&app, list).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["templates"][0]["content"], "official");
}

#[tokio::test]
async fn test_list_variables() {
    let app = create_test_app(None);
    let request = Request::builder()
        .uri("/api/v1/categories/pickup/variables")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "PICKUP");
    let variables = body["variables"].as_array().unwrap();
    assert!(variables.contains(&json!("RETIRADO_POR")));
    assert!(body["default_template"].as_str().unwrap().contains("{PROTOCOLO}"));
}

#[tokio::test]
async fn test_api_key_is_enforced_when_configured() {
    let app = create_test_app(Some("secret"));

    let missing = Request::builder()
        .uri("/api/v1/categories/ARRIVAL/variables")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, missing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let with_key = Request::builder()
        .uri("/api/v1/categories/ARRIVAL/variables")
        .header("X-API-Key", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, with_key).await;
    assert_eq!(status, StatusCode::OK);

    // Health stays open for probes
    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = send(&app, health).await;
    assert_eq!(status, StatusCode::OK);
}
