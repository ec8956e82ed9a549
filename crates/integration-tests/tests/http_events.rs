//! Integration tests for the event delivery endpoint.
//!
//! Requests are driven through the router with `oneshot`; no socket is bound.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use registration_notifier::db::AdminDirectory;
use registration_notifier::routes::routes;
use registration_notifier::services::{InMemorySecretProvider, MailTransport};
use registration_notifier::state::AppState;
use registration_notifier_integration_tests::{
    FailingDirectory, FailingTransport, RecordingTransport, StaticDirectory, credentials,
    notifier,
};

fn app<D, T>(directory: D, transport: T) -> Router
where
    D: AdminDirectory + 'static,
    T: MailTransport + 'static,
{
    let state = AppState::new(notifier(directory, credentials(), transport), "users");
    routes::<D, InMemorySecretProvider, T>().with_state(state)
}

fn admins() -> StaticDirectory {
    StaticDirectory::from_documents(&[json!({"email": "admin@example.com"})])
}

fn created(name: &str) -> Value {
    json!({
        "oldValue": {},
        "value": {
            "name": name,
            "fields": {
                "fullName": {"stringValue": "Jane Doe"},
                "email": {"stringValue": "jane@example.com"},
                "role": {"stringValue": "farmer"}
            },
            "createTime": "2026-05-04T10:00:00.123456Z"
        },
        "updateMask": {}
    })
}

fn post(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("ce-id", "1234")
        .header("ce-type", "google.cloud.firestore.document.v1.created")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const USER_DOC: &str = "projects/demo/databases/(default)/documents/users/jane-uid";

#[tokio::test]
async fn test_created_user_notifies_and_returns_no_content() {
    let transport = RecordingTransport::default();

    let response = app(admins(), transport.clone())
        .oneshot(post(&created(USER_DOC)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].message.text.contains("Name: Jane Doe"));
    assert!(sent[0].message.text.contains("Role: farmer"));
}

#[tokio::test]
async fn test_skip_paths_return_no_content() {
    let transport = RecordingTransport::default();

    let response = app(StaticDirectory::default(), transport.clone())
        .oneshot(post(&created(USER_DOC)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_transport_failure_returns_server_error() {
    let response = app(admins(), FailingTransport)
        .oneshot(post(&created(USER_DOC)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_directory_failure_returns_server_error() {
    let response = app(FailingDirectory, RecordingTransport::default())
        .oneshot(post(&created(USER_DOC)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_other_collection_rejected() {
    let transport = RecordingTransport::default();

    let response = app(admins(), transport.clone())
        .oneshot(post(&created(
            "projects/demo/databases/(default)/documents/admins/a1",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{\"value\": 42"))
        .unwrap();

    let response = app(admins(), RecordingTransport::default())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_document_rejected() {
    let response = app(admins(), RecordingTransport::default())
        .oneshot(post(&json!({"oldValue": {}})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app(admins(), RecordingTransport::default())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
