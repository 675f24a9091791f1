//! Integration tests for agent and permission endpoints.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::api::{AppState, IntegrationConfig, routes};
use crate::db::{AgentLog, AgentLogRepository, Database, LogResult, SqliteDatabase};

/// Create a test app with an in-memory database
async fn test_app() -> axum::Router {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to run migrations");
    routes::create_router(
        AppState::new(db, IntegrationConfig::default()),
        CancellationToken::new(),
    )
}

/// Helper to parse JSON response body
async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create_agent(app: &axum::Router, name: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/agents", json!({"name": name})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

// =============================================================================
// /api/v1/agents
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn list_agents_initially_empty() {
    let app = test_app().await;

    let response = app.oneshot(get("/api/v1/agents")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_and_get_agent() {
    let app = test_app().await;

    let created = create_agent(&app, "WhatsApp assistant").await;
    assert_eq!(created["name"], "WhatsApp assistant");
    assert_eq!(created["is_active"], true);
    let id = created["id"].as_str().unwrap();
    assert_eq!(id.len(), 8);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/agents/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["id"], id);

    let response = app.oneshot(get("/api/v1/agents")).await.unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_agent_requires_name() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request("POST", "/api/v1/agents", json!({"name": " "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn get_missing_agent_is_not_found() {
    let app = test_app().await;

    let response = app.oneshot(get("/api/v1/agents/nope0000")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_agent() {
    let app = test_app().await;
    let created = create_agent(&app, "Temp").await;
    let uri = format!("/api/v1/agents/{}", created["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(Request::builder().method("DELETE").uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_agent_keeps_audit_log() {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to run migrations");
    let state = AppState::new(db, IntegrationConfig::default());
    let db = state.db_arc();
    let app = routes::create_router(state, CancellationToken::new());

    let created = create_agent(&app, "Retired bot").await;
    let id = created["id"].as_str().unwrap().to_string();
    db.agent_logs()
        .append(&AgentLog {
            id: String::new(),
            agent_id: id.clone(),
            agent_name: "Retired bot".to_string(),
            module: "leads-server".to_string(),
            action: "create_lead".to_string(),
            result: LogResult::Success,
            user_context: None,
            details: None,
            created_at: String::new(),
        })
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/agents/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get(&format!("/api/v1/agent-logs?agent_id={}", id)))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["agent_name"], "Retired bot");
}

// =============================================================================
// /api/v1/agents/{id}/permissions
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn permissions_replace_whole_map() {
    let app = test_app().await;
    let created = create_agent(&app, "Planner").await;
    let uri = format!(
        "/api/v1/agents/{}/permissions",
        created["id"].as_str().unwrap()
    );

    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({}));

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            json!({
                "tasks-server": {"enabled": true, "tools": ["get_tasks", "create_task"]},
                "leads-server": {"enabled": false, "tools": []}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            json!({"expenses-server": {"enabled": true, "tools": ["get_expenses"]}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get(&uri)).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({"expenses-server": {"enabled": true, "tools": ["get_expenses"]}})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn permissions_reject_unknown_module() {
    let app = test_app().await;
    let created = create_agent(&app, "Planner").await;
    let uri = format!(
        "/api/v1/agents/{}/permissions",
        created["id"].as_str().unwrap()
    );

    let response = app
        .oneshot(json_request(
            "PUT",
            &uri,
            json!({"billing-server": {"enabled": true, "tools": []}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Unknown module"));
}

#[tokio::test(flavor = "multi_thread")]
async fn permissions_for_missing_agent() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/v1/agents/nope0000/permissions",
            json!({"tasks-server": {"enabled": true, "tools": []}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
