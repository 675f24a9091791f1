//! Tests for the per-module MCP server: tool schemas, resources, prompts
//! and guarded dispatch.

use std::sync::Arc;

use rmcp::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ErrorCode, JsonObject, PromptMessageContent, ResourceContents};
use serde_json::{Value, json};

use crate::db::{
    Agent, AgentLogQuery, AgentLogRepository, AgentPermissions, AgentRepository, Database,
    LogResult, ModulePermission, SqliteDatabase, Task, TaskRepository,
};
use crate::mcp::McpServer;
use crate::mcp::tools::CreateExpenseParams;
use crate::mcp::tools::{ExpenseTools, TaskTools};

async fn setup_db() -> Arc<SqliteDatabase> {
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    Arc::new(db)
}

fn task_server(db: &Arc<SqliteDatabase>) -> McpServer<SqliteDatabase, TaskTools<SqliteDatabase>> {
    McpServer::new(Arc::clone(db))
}

fn expense_server(
    db: &Arc<SqliteDatabase>,
) -> McpServer<SqliteDatabase, ExpenseTools<SqliteDatabase>> {
    McpServer::new(Arc::clone(db))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_tool_requires_agent_id() {
    let db = setup_db().await;
    let server = task_server(&db);

    let tools = server.tool_list();
    assert_eq!(tools.len(), 8);

    for tool in tools {
        let schema = &tool.input_schema;
        assert_eq!(
            schema["properties"]["agent_id"]["type"], "string",
            "{} lacks agent_id property",
            tool.name
        );
        let required = schema["required"].as_array().expect("required list");
        assert_eq!(
            required.iter().filter(|r| *r == "agent_id").count(),
            1,
            "{} should require agent_id once",
            tool.name
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_module_tool_names() {
    let db = setup_db().await;
    let mut names: Vec<String> = expense_server(&db)
        .tool_list()
        .into_iter()
        .map(|t| t.name.to_string())
        .collect();
    names.sort();

    assert_eq!(
        names,
        vec![
            "create_expense",
            "delete_expense",
            "get_expenses",
            "update_expense"
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_info_enables_capabilities() {
    let db = setup_db().await;
    let info = task_server(&db).get_info();

    assert!(info.capabilities.tools.is_some());
    assert!(info.capabilities.resources.is_some());
    assert!(info.capabilities.prompts.is_some());
    assert!(info.instructions.unwrap().contains("tasks-server"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resources_list_recent_views() {
    let db = setup_db().await;
    let uris: Vec<String> = task_server(&db)
        .resource_list()
        .into_iter()
        .map(|r| r.raw.uri)
        .collect();

    assert_eq!(
        uris,
        vec!["crm://tasks/recent", "crm://recurring_tasks/recent"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_recent_resource() {
    let db = setup_db().await;
    for title in ["Older", "Newer"] {
        db.tasks()
            .create(&Task {
                id: String::new(),
                task_id: String::new(),
                title: title.to_string(),
                description: None,
                status: Default::default(),
                priority: Default::default(),
                assigned_to: None,
                contact_id: None,
                due_date: None,
                created_at: String::new(),
                updated_at: String::new(),
                completed_at: None,
            })
            .await
            .unwrap();
    }

    let result = task_server(&db).read("crm://tasks/recent").await.unwrap();
    let text = match &result.contents[0] {
        ResourceContents::TextResourceContents { text, .. } => text.clone(),
        _ => panic!("Expected text resource"),
    };
    let rows: Value = serde_json::from_str(&text).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r["title"] == "Newer"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_unknown_resource() {
    let db = setup_db().await;
    let server = task_server(&db);

    for uri in ["crm://expenses/recent", "crm://tasks", "https://example.com"] {
        let err = server.read(uri).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND, "{}", uri);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_overview_prompt() {
    let db = setup_db().await;
    let server = task_server(&db);

    let prompts = server.prompt_list();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].name, "tasks-overview");

    let prompt = server.prompt("tasks-overview").unwrap();
    let text = match &prompt.messages[0].content {
        PromptMessageContent::Text { text } => text.clone(),
        _ => panic!("Expected text prompt"),
    };
    assert!(text.contains("agent_id"));
    assert!(text.contains("create_recurring_task"));

    let err = server.prompt("leads-overview").unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_guarded_call_runs_tool_and_audits() {
    let db = setup_db().await;
    let agent = db
        .agents()
        .create(&Agent {
            id: String::new(),
            name: "Bookkeeper".to_string(),
            description: None,
            is_active: true,
            created_at: String::new(),
        })
        .await
        .unwrap();
    let mut grants = AgentPermissions::new();
    grants.insert(
        "expenses-server".to_string(),
        ModulePermission {
            enabled: true,
            tools: vec!["create_expense".to_string()],
        },
    );
    db.agents().set_permissions(&agent.id, &grants).await.unwrap();

    let server = expense_server(&db);
    let arguments: JsonObject = match json!({
        "agent_id": agent.id,
        "title": "Courier",
        "amount": 250.0
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };

    server
        .guard()
        .run("create_expense", Some(&arguments), || {
            server.tools().create_expense(Parameters(CreateExpenseParams {
                title: "Courier".to_string(),
                amount: 250.0,
                ..Default::default()
            }))
        })
        .await
        .expect("permitted call should succeed");

    let logs = db
        .agent_logs()
        .list(&AgentLogQuery::default())
        .await
        .unwrap();
    assert_eq!(logs.total, 1);
    assert_eq!(logs.items[0].result, LogResult::Success);
    assert_eq!(logs.items[0].module, "expenses-server");
    assert_eq!(logs.items[0].details.as_ref().unwrap()["title"], "Courier");
}
