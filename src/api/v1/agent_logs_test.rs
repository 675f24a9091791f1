//! Integration tests for the audit log endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::api::{AppState, IntegrationConfig, routes};
use crate::db::{
    Agent, AgentLog, AgentLogRepository, AgentRepository, Database, LogResult, SqliteDatabase,
};

async fn test_app() -> axum::Router {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to run migrations");

    let agent = db
        .agents()
        .create(&Agent {
            id: "agent001".to_string(),
            name: "Planner".to_string(),
            description: None,
            is_active: true,
            created_at: String::new(),
        })
        .await
        .unwrap();

    let rows = [
        ("tasks-server", "get_tasks", LogResult::Success),
        ("tasks-server", "delete_task", LogResult::Denied),
        ("leads-server", "create_lead", LogResult::Error),
        ("tasks-server", "create_task", LogResult::Success),
    ];
    for (module, action, result) in rows {
        db.agent_logs()
            .append(&AgentLog {
                id: String::new(),
                agent_id: agent.id.clone(),
                agent_name: agent.name.clone(),
                module: module.to_string(),
                action: action.to_string(),
                result,
                user_context: Some(json!({"user": "asha"})),
                details: None,
                created_at: String::new(),
            })
            .await
            .unwrap();
    }

    routes::create_router(
        AppState::new(db, IntegrationConfig::default()),
        CancellationToken::new(),
    )
}

async fn fetch(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn lists_newest_first() {
    let (status, body) = fetch(test_app().await, "/api/v1/agent-logs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["items"][0]["action"], "create_task");
    assert_eq!(body["items"][0]["user_context"]["user"], "asha");
}

#[tokio::test(flavor = "multi_thread")]
async fn filters_by_module_and_result() {
    let app = test_app().await;

    let (_, body) = fetch(app.clone(), "/api/v1/agent-logs?module=tasks-server").await;
    assert_eq!(body["total"], 3);

    let (_, body) = fetch(app.clone(), "/api/v1/agent-logs?result=Denied").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["action"], "delete_task");

    let (_, body) = fetch(app, "/api/v1/agent-logs?agent_id=someone").await;
    assert_eq!(body["total"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn paginates() {
    let (_, body) = fetch(test_app().await, "/api/v1/agent-logs?limit=2&offset=2").await;

    assert_eq!(body["total"], 4);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["offset"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejects_unknown_result() {
    let (status, body) = fetch(test_app().await, "/api/v1/agent-logs?result=Maybe").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
