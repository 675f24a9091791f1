//! Tests for agents, their permissions, audit logs and OTP storage.

use serde_json::json;

use crate::db::utils::timestamp_after;
use crate::db::{
    Agent, AgentLog, AgentLogQuery, AgentLogRepository, AgentPermissions, AgentRepository,
    Database, DbError, LogResult, ModulePermission, OtpRepository, OtpVerification, Page,
    SqliteDatabase,
};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.migrate().await.expect("Migration should succeed");
    db
}

fn make_agent(name: &str) -> Agent {
    Agent {
        id: String::new(),
        name: name.to_string(),
        description: None,
        is_active: true,
        created_at: String::new(),
    }
}

fn make_log(agent: &Agent, action: &str, result: LogResult) -> AgentLog {
    AgentLog {
        id: String::new(),
        agent_id: agent.id.clone(),
        agent_name: agent.name.clone(),
        module: "tasks-server".to_string(),
        action: action.to_string(),
        result,
        user_context: Some(json!({"user": "asha"})),
        details: None,
        created_at: String::new(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn permissions_round_trip_through_json_column() {
    let db = setup_db().await;
    let agents = db.agents();
    let agent = agents.create(&make_agent("Scheduler")).await.expect("create");

    let mut grants = AgentPermissions::new();
    grants.insert(
        "tasks-server".to_string(),
        ModulePermission {
            enabled: true,
            tools: vec!["create_task".to_string(), "get_tasks".to_string()],
        },
    );
    grants.insert(
        "expenses-server".to_string(),
        ModulePermission {
            enabled: false,
            tools: vec!["get_expenses".to_string()],
        },
    );
    agents.set_permissions(&agent.id, &grants).await.expect("set");

    let stored = agents.permissions(&agent.id).await.expect("get");
    assert_eq!(stored, grants);

    let tasks = agents
        .module_permission(&agent.id, "tasks-server")
        .await
        .expect("lookup")
        .expect("grant exists");
    assert!(tasks.allows("create_task"));
    assert!(!tasks.allows("delete_task"));

    let expenses = agents
        .module_permission(&agent.id, "expenses-server")
        .await
        .expect("lookup")
        .expect("grant exists");
    assert!(!expenses.allows("get_expenses"));

    assert!(
        agents
            .module_permission(&agent.id, "leads-server")
            .await
            .expect("lookup")
            .is_none()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn set_permissions_replaces_previous_grants() {
    let db = setup_db().await;
    let agents = db.agents();
    let agent = agents.create(&make_agent("Clerk")).await.expect("create");

    let mut first = AgentPermissions::new();
    first.insert(
        "leads-server".to_string(),
        ModulePermission {
            enabled: true,
            tools: vec!["get_leads".to_string()],
        },
    );
    agents.set_permissions(&agent.id, &first).await.expect("set");
    agents
        .set_permissions(&agent.id, &AgentPermissions::new())
        .await
        .expect("clear");

    assert!(agents.permissions(&agent.id).await.expect("get").is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn permissions_for_unknown_agent_is_not_found() {
    let db = setup_db().await;
    let result = db
        .agents()
        .set_permissions("ghost000", &AgentPermissions::new())
        .await;
    assert!(matches!(result, Err(DbError::NotFound { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn logs_are_newest_first_and_filterable() {
    let db = setup_db().await;
    let agent = db.agents().create(&make_agent("Bot")).await.expect("create");
    let logs = db.agent_logs();

    logs.append(&make_log(&agent, "get_tasks", LogResult::Success))
        .await
        .expect("append");
    logs.append(&make_log(&agent, "delete_task", LogResult::Denied))
        .await
        .expect("append");
    logs.append(&make_log(&agent, "create_task", LogResult::Error))
        .await
        .expect("append");

    let all = logs.list(&AgentLogQuery::default()).await.expect("list");
    assert_eq!(all.total, 3);
    assert_eq!(all.items[0].action, "create_task");
    assert_eq!(all.items[0].user_context, Some(json!({"user": "asha"})));

    let denied = logs
        .list(&AgentLogQuery {
            result: Some(LogResult::Denied),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(denied.total, 1);
    assert_eq!(denied.items[0].action, "delete_task");

    let first_page = logs
        .list(&AgentLogQuery {
            page: Page::limit(Some(2)),
            agent_id: Some(agent.id.clone()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(first_page.items.len(), 2);
    assert_eq!(first_page.total, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_agent_drops_permissions_but_keeps_logs() {
    let db = setup_db().await;
    let agent = db.agents().create(&make_agent("Temp")).await.expect("create");

    let mut grants = AgentPermissions::new();
    grants.insert("tasks-server".to_string(), ModulePermission::default());
    db.agents().set_permissions(&agent.id, &grants).await.expect("set");
    db.agent_logs()
        .append(&make_log(&agent, "get_tasks", LogResult::Success))
        .await
        .expect("append");

    db.agents().delete(&agent.id).await.expect("delete");

    let perms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ai_agent_permissions")
        .fetch_one(db.pool())
        .await
        .expect("count");
    assert_eq!(perms, 0);

    let logs = db
        .agent_logs()
        .list(&AgentLogQuery {
            agent_id: Some(agent.id.clone()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(logs.total, 1);
    assert_eq!(logs.items[0].agent_name, "Temp");
    assert_eq!(logs.items[0].action, "get_tasks");
}

#[tokio::test(flavor = "multi_thread")]
async fn otp_attempts_and_verification() {
    let db = setup_db().await;
    let otps = db.otps();

    let otp = otps
        .create(&OtpVerification {
            id: String::new(),
            mobile: "9000000001".to_string(),
            otp: "4821".to_string(),
            expires_at: timestamp_after(chrono::Duration::minutes(5)),
            verified: false,
            attempts: 0,
            created_at: String::new(),
        })
        .await
        .expect("create");

    assert_eq!(otps.record_failed_attempt(&otp.id).await.expect("fail"), 1);
    assert_eq!(otps.record_failed_attempt(&otp.id).await.expect("fail"), 2);

    let pending = otps
        .latest_pending("9000000001")
        .await
        .expect("lookup")
        .expect("pending");
    assert_eq!(pending.attempts, 2);

    otps.mark_verified(&otp.id).await.expect("verify");
    assert!(
        otps.latest_pending("9000000001")
            .await
            .expect("lookup")
            .is_none()
    );
}
