use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use findeasy_backend::api::auth::Claims;
use findeasy_backend::config::Config;
use async_trait::async_trait;
use findeasy_backend::db::kv::{InMemoryKeyValueStore, KeyValueStore, StorageError, StorageResult};
use findeasy_backend::AppState;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const CLIENT: &str = "client-1";
const PRO: &str = "pro-1";

fn test_config(seed: bool) -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "STORAGE_BACKEND" => Some("memory".to_string()),
        "SEED_SAMPLE_DATA" => Some(seed.to_string()),
        _ => None,
    })
    .expect("test config")
}

async fn build_test_app(seed: bool) -> Router {
    let state = AppState::new(test_config(seed), Arc::new(InMemoryKeyValueStore::new())).await;
    findeasy_backend::app(state)
}

fn token(user_id: &str, role: &str) -> String {
    Claims::new(user_id, user_id, role, 4_000_000_000)
        .sign(SECRET)
        .expect("sign token")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_logo_request(app: &Router) -> String {
    let client = token(CLIENT, "client");
    let (status, body) = send(
        app,
        Method::POST,
        "/service-requests",
        Some(&client),
        Some(json!({
            "professionalId": PRO,
            "serviceTitle": "Logo Design",
            "description": "Need a logo",
            "budget": "$200"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn set_status(app: &Router, id: &str, who: &str, role: &str, status: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::PATCH,
        &format!("/service-requests/{id}/status"),
        Some(&token(who, role)),
        Some(json!({ "status": status })),
    )
    .await
}

#[tokio::test]
async fn health_is_public() {
    let app = build_test_app(false).await;

    let (status, body) = send(&app, Method::GET, "/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn api_requires_a_valid_token() {
    let app = build_test_app(true).await;

    let (status, _) = send(&app, Method::GET, "/service-requests/req-1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/service-requests/req-1", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = Claims::new(CLIENT, CLIENT, "client", 4_000_000_000)
        .sign("another-secret")
        .unwrap();
    let (status, _) = send(&app, Method::GET, "/service-requests/req-1", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn seeded_request_is_visible() {
    let app = build_test_app(true).await;
    let client = token("user-123", "client");

    let (status, body) = send(&app, Method::GET, "/service-requests/req-1", Some(&client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["serviceTitle"], "Website Development");
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn client_creates_pending_request() {
    let app = build_test_app(false).await;
    let id = create_logo_request(&app).await;
    let client = token(CLIENT, "client");

    let (status, body) = send(&app, Method::GET, &format!("/service-requests/{id}"), Some(&client), None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["status"], "pending");
    assert_eq!(data["userId"], CLIENT);
    assert_eq!(data["messages"], json!([]));
    assert_eq!(data["reviewed"], false);
    assert!(data.get("completedAt").is_none());

    let (_, body) = send(&app, Method::GET, &format!("/service-requests/user/{CLIENT}"), Some(&client), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::GET, &format!("/service-requests/professional/{PRO}"), Some(&client), None).await;
    assert_eq!(body["data"][0]["id"], id.as_str());
}

#[tokio::test]
async fn create_with_missing_fields_is_rejected() {
    let app = build_test_app(false).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/service-requests",
        Some(&token(CLIENT, "client")),
        Some(json!({ "professionalId": PRO, "serviceTitle": "", "description": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let app = build_test_app(false).await;
    let (status, _) = send(
        &app,
        Method::GET,
        "/service-requests/req-missing",
        Some(&token(CLIENT, "client")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = set_status(&app, "req-missing", PRO, "professional", "accepted").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transitions_are_role_gated() {
    let app = build_test_app(false).await;
    let id = create_logo_request(&app).await;

    let (status, body) = set_status(&app, &id, CLIENT, "client", "accepted").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errors"]["from"], "pending");

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/service-requests/{id}/actions"),
        Some(&token(PRO, "professional")),
        None,
    )
    .await;
    let labels: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["label"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(labels, vec!["Accept Request", "Reject Request"]);

    let (status, body) = set_status(&app, &id, PRO, "professional", "accepted").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");
    assert_eq!(body["message"], "Service request has been accepted.");
    assert!(body["data"].get("completedAt").is_none());
}

#[tokio::test]
async fn unknown_role_is_forbidden() {
    let app = build_test_app(false).await;
    let id = create_logo_request(&app).await;
    let (status, _) = set_status(&app, &id, "admin-1", "admin", "accepted").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn full_lifecycle_with_messages_and_review() {
    let app = build_test_app(false).await;
    let id = create_logo_request(&app).await;
    let client = token(CLIENT, "client");
    let pro = token(PRO, "professional");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/messages"),
        Some(&client),
        Some(json!({ "message": "When can you start?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/messages"),
        Some(&pro),
        Some(json!({ "message": "Tomorrow." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/messages/read"),
        Some(&pro),
        None,
    )
    .await;
    assert_eq!(body["data"], 1);

    for next in ["accepted", "in_progress", "awaiting_confirmation"] {
        let (status, _) = set_status(&app, &id, PRO, "professional", next).await;
        assert_eq!(status, StatusCode::OK, "{next}");
    }
    let (status, body) = set_status(&app, &id, CLIENT, "client", "completed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completedAt"], body["data"]["updatedAt"]);

    let (_, body) = send(&app, Method::GET, &format!("/service-requests/{id}/tracker"), Some(&client), None).await;
    let view = &body["data"];
    assert_eq!(view["statusLabel"], "Completed");
    assert_eq!(view["canReview"], true);
    assert_eq!(view["timeline"].as_array().unwrap().len(), 5);
    assert_eq!(view["messages"][0]["fromClient"], true);
    assert_eq!(view["messages"][1]["fromClient"], false);

    let (_, body) = send(&app, Method::GET, &format!("/service-requests/{id}/tracker"), Some(&pro), None).await;
    assert_eq!(body["data"]["canReview"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/review"),
        Some(&client),
        Some(json!({ "rating": 5, "comment": "Great logo" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let review_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, &format!("/service-requests/{id}"), Some(&client), None).await;
    assert_eq!(body["data"]["reviewed"], true);
    assert_eq!(body["data"]["reviewId"], review_id.as_str());
    assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/review"),
        Some(&client),
        Some(json!({ "rating": 4, "comment": "Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, Method::GET, &format!("/professionals/{PRO}/reviews"), Some(&client), None).await;
    assert_eq!(body["data"][0]["rating"], 5);
    assert_eq!(body["data"][0]["reviewerId"], CLIENT);

    let (_, body) = send(&app, Method::GET, "/service-requests/summary", Some(&pro), None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["completed"], 1);

    let (_, body) = send(&app, Method::GET, "/notifications", Some(&pro), None).await;
    let titles: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles.first().map(String::as_str), Some("Review Submitted"));
    assert_eq!(titles.last().map(String::as_str), Some("Service Request Sent"));
    assert_eq!(titles.iter().filter(|t| *t == "Status Updated").count(), 4);

    let (_, body) = send(
        &app,
        Method::GET,
        "/notifications?type=service_request_status&limit=1",
        Some(&pro),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["body"], "Service has been marked as completed.");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_test_app(false).await;
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/service-requests/{request_id}/status"].is_object());
}

#[tokio::test]
async fn strangers_cannot_act_on_someone_elses_request() {
    let app = build_test_app(false).await;
    let id = create_logo_request(&app).await;

    let (status, body) = set_status(&app, &id, "pro-other", "professional", "accepted").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    for next in ["accepted", "in_progress", "awaiting_confirmation"] {
        let (status, _) = set_status(&app, &id, PRO, "professional", next).await;
        assert_eq!(status, StatusCode::OK, "{next}");
    }

    let stranger = token("client-other", "client");
    let (status, _) = set_status(&app, &id, "client-other", "client", "completed").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/messages"),
        Some(&stranger),
        Some(json!({ "message": "hello?" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/messages/read"),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = set_status(&app, &id, CLIENT, "client", "completed").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/review"),
        Some(&stranger),
        Some(json!({ "rating": 1, "comment": "Never hired them" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The real client can still leave the one review.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/review"),
        Some(&token(CLIENT, "client")),
        Some(json!({ "rating": 5, "comment": "Great logo" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["reviewerId"], CLIENT);

    let (_, body) = send(&app, Method::GET, &format!("/service-requests/{id}"), Some(&stranger), None).await;
    assert!(body["data"]["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_bodies_answer_with_the_envelope() {
    let app = build_test_app(false).await;
    let id = create_logo_request(&app).await;

    let (status, body) = set_status(&app, &id, PRO, "professional", "bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["status_code"], 400);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/service-requests/{id}/review"),
        Some(&token(CLIENT, "client")),
        Some(json!({ "rating": 300, "comment": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["errors"]["error"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/service-requests",
        Some(&token(CLIENT, "client")),
        Some(json!({ "serviceTitle": "Missing the rest" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, Method::GET, &format!("/service-requests/{id}"), Some(&token(CLIENT, "client")), None).await;
    assert_eq!(body["data"]["status"], "pending");
}

struct UnreachableStore;

#[async_trait]
impl KeyValueStore for UnreachableStore {
    async fn read(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Io(std::io::Error::other("connection refused")))
    }

    async fn write(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Io(std::io::Error::other("connection refused")))
    }

    fn backend(&self) -> &'static str {
        "unreachable"
    }
}

#[tokio::test]
async fn readiness_failure_is_json() {
    let state = AppState::new(test_config(false), Arc::new(UnreachableStore)).await;
    let app = findeasy_backend::app(state);

    let response = app
        .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["storage"], "unreachable");
}
