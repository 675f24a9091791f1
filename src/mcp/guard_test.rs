//! Tests for the permission guard: authorization and audit logging.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content, ErrorCode, JsonObject};
use serde_json::{Value, json};

use crate::db::{
    Agent, AgentLogQuery, AgentLogRepository, AgentPermissions, AgentRepository, Database,
    LogResult, ModulePermission, SqliteDatabase,
};
use crate::mcp::{Module, PermissionGuard};

async fn setup() -> (Arc<SqliteDatabase>, PermissionGuard<SqliteDatabase>) {
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    let db = Arc::new(db);
    let guard = PermissionGuard::new(Arc::clone(&db), Module::Tasks);
    (db, guard)
}

async fn create_agent(db: &SqliteDatabase, tools: &[&str], enabled: bool) -> Agent {
    let agent = db
        .agents()
        .create(&Agent {
            id: String::new(),
            name: "Planner".to_string(),
            description: None,
            is_active: true,
            created_at: String::new(),
        })
        .await
        .unwrap();

    let mut grants = AgentPermissions::new();
    grants.insert(
        "tasks-server".to_string(),
        ModulePermission {
            enabled,
            tools: tools.iter().map(|t| t.to_string()).collect(),
        },
    );
    db.agents().set_permissions(&agent.id, &grants).await.unwrap();
    agent
}

fn args(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => panic!("arguments must be an object"),
    }
}

async fn ok_handler() -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text("ok")]))
}

async fn log_rows(db: &SqliteDatabase) -> Vec<crate::db::AgentLog> {
    db.agent_logs()
        .list(&AgentLogQuery::default())
        .await
        .unwrap()
        .items
}

fn error_result(err: &McpError) -> Option<&str> {
    err.data.as_ref().and_then(|d| d["result"].as_str())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_agent_id_is_rejected_without_log() {
    let (db, guard) = setup().await;

    let err = guard
        .run("get_tasks", Some(&args(json!({"status": "pending"}))), ok_handler)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    assert_eq!(err.message, "agent_id is required");
    assert!(log_rows(&db).await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_agent_id_is_rejected() {
    let (_db, guard) = setup().await;

    let err = guard
        .run("get_tasks", Some(&args(json!({"agent_id": "  "}))), ok_handler)
        .await
        .unwrap_err();
    assert_eq!(err.message, "agent_id is required");

    let err = guard.run("get_tasks", None, ok_handler).await.unwrap_err();
    assert_eq!(err.message, "agent_id is required");
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_agent_is_rejected_and_never_logged() {
    let (db, guard) = setup().await;
    let mut handler_ran = false;

    let err = guard
        .run("get_tasks", Some(&args(json!({"agent_id": "ghost000"}))), || {
            handler_ran = true;
            ok_handler()
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    assert_eq!(err.message, "Agent not found: ghost000");
    assert!(!handler_ran);
    assert!(log_rows(&db).await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn tool_outside_allow_list_is_denied_and_logged() {
    let (db, guard) = setup().await;
    let agent = create_agent(&db, &["get_tasks"], true).await;
    let mut handler_ran = false;

    let err = guard
        .run(
            "delete_task",
            Some(&args(json!({"agent_id": agent.id, "id": "TASK-0001"}))),
            || {
                handler_ran = true;
                ok_handler()
            },
        )
        .await
        .unwrap_err();

    assert!(!handler_ran);
    assert_eq!(error_result(&err), Some("Denied"));
    assert_eq!(
        err.message,
        "Permission denied: agent 'Planner' may not call 'delete_task' on tasks-server"
    );

    let rows = log_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].result, LogResult::Denied);
    assert_eq!(rows[0].action, "delete_task");
    assert_eq!(rows[0].module, "tasks-server");
}

#[tokio::test(flavor = "multi_thread")]
async fn disabled_module_denies_listed_tools() {
    let (db, guard) = setup().await;
    let agent = create_agent(&db, &["get_tasks"], false).await;

    let err = guard
        .run("get_tasks", Some(&args(json!({"agent_id": agent.id}))), ok_handler)
        .await
        .unwrap_err();

    assert_eq!(error_result(&err), Some("Denied"));
    assert_eq!(log_rows(&db).await[0].result, LogResult::Denied);
}

#[tokio::test(flavor = "multi_thread")]
async fn grant_for_other_module_does_not_apply() {
    let (db, _) = setup().await;
    let agent = create_agent(&db, &["get_tasks"], true).await;
    let leads_guard = PermissionGuard::new(Arc::clone(&db), Module::Leads);

    let err = leads_guard
        .run("get_tasks", Some(&args(json!({"agent_id": agent.id}))), ok_handler)
        .await
        .unwrap_err();
    assert_eq!(error_result(&err), Some("Denied"));
}

#[tokio::test(flavor = "multi_thread")]
async fn inactive_agent_is_denied() {
    let (db, guard) = setup().await;
    let agent = create_agent(&db, &["get_tasks"], true).await;
    sqlx::query("UPDATE ai_agents SET is_active = 0 WHERE id = ?")
        .bind(&agent.id)
        .execute(db.pool())
        .await
        .unwrap();

    let err = guard
        .run("get_tasks", Some(&args(json!({"agent_id": agent.id}))), ok_handler)
        .await
        .unwrap_err();
    assert_eq!(error_result(&err), Some("Denied"));
}

#[tokio::test(flavor = "multi_thread")]
async fn allowed_call_logs_success_with_details_and_context() {
    let (db, guard) = setup().await;
    let agent = create_agent(&db, &["get_tasks"], true).await;

    let result = guard
        .run(
            "get_tasks",
            Some(&args(json!({
                "agent_id": agent.id,
                "status": "pending",
                "user_context": {"user": "asha", "channel": "whatsapp"}
            }))),
            ok_handler,
        )
        .await
        .expect("allowed call should succeed");
    assert_eq!(result.is_error, Some(false));

    let rows = log_rows(&db).await;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.result, LogResult::Success);
    assert_eq!(row.agent_name, "Planner");
    assert_eq!(
        row.user_context,
        Some(json!({"user": "asha", "channel": "whatsapp"}))
    );
    let details = row.details.as_ref().expect("details recorded");
    assert_eq!(details["status"], "pending");
    assert!(details.get("agent_id").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_tool_logs_error_row() {
    let (db, guard) = setup().await;
    let agent = create_agent(&db, &["create_task"], true).await;

    let err = guard
        .run(
            "create_task",
            Some(&args(json!({"agent_id": agent.id, "title": ""}))),
            || async { Err(McpError::invalid_params("title cannot be empty", None)) },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    assert_eq!(err.message, "title cannot be empty");
    assert_eq!(error_result(&err), Some("Error"));

    let rows = log_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].result, LogResult::Error);
    assert_eq!(
        rows[0].details,
        Some(json!({"error": "title cannot be empty"}))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn every_allowed_call_writes_exactly_one_row() {
    let (db, guard) = setup().await;
    let agent = create_agent(&db, &["get_tasks"], true).await;

    for _ in 0..3 {
        guard
            .run("get_tasks", Some(&args(json!({"agent_id": agent.id}))), ok_handler)
            .await
            .unwrap();
    }

    assert_eq!(log_rows(&db).await.len(), 3);
}
