use crate::cli::api_client::ApiClient;
use crate::cli::commands::agent::*;
use crate::cli::commands::test_server;
use crate::cli::error::CliError;

// =============================================================================
// Integration Tests - Test CLI commands against real HTTP server
// =============================================================================

/// Extract the ID from "✓ Created agent: Name (id)"
fn created_id(output: &str) -> String {
    output
        .rsplit('(')
        .next()
        .and_then(|s| s.split(')').next())
        .expect("Failed to extract agent ID")
        .to_string()
}

async fn create(api_client: &ApiClient, name: &str) -> String {
    let output = create_agent(
        api_client,
        CreateAgentRequest {
            name: name.to_string(),
            description: Some("Answers WhatsApp leads".to_string()),
        },
    )
    .await
    .expect("create agent");
    created_id(&output)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_and_list_agents() {
    let (url, _db) = test_server::spawn().await;
    let api_client = ApiClient::new(Some(url));

    let empty = list_agents(&api_client, "table").await.unwrap();
    assert_eq!(empty, "No agents found.");

    let id = create(&api_client, "Lead bot").await;
    assert_eq!(id.len(), 8);

    let table = list_agents(&api_client, "table").await.unwrap();
    assert!(table.contains("Lead bot"));
    assert!(table.contains(&id));

    let json = list_agents(&api_client, "json").await.unwrap();
    let agents: Vec<Agent> = serde_json::from_str(&json).unwrap();
    assert_eq!(agents.len(), 1);
    assert!(agents[0].is_active);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_grant_merges_tools_and_revoke_disables() {
    let (url, _db) = test_server::spawn().await;
    let api_client = ApiClient::new(Some(url));
    let id = create(&api_client, "Planner").await;

    grant(
        &api_client,
        &id,
        "tasks-server",
        vec!["get_tasks".to_string(), "create_task".to_string()],
    )
    .await
    .unwrap();
    let output = grant(
        &api_client,
        &id,
        "tasks-server",
        vec!["create_task".to_string(), "update_task".to_string()],
    )
    .await
    .unwrap();
    assert!(output.contains("get_tasks, create_task, update_task"));

    grant(&api_client, &id, "leads-server", vec!["get_leads".to_string()])
        .await
        .unwrap();
    revoke(&api_client, &id, "tasks-server").await.unwrap();

    let json = get_agent(&api_client, &id, "json").await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let tasks = &value["permissions"]["tasks-server"];
    assert_eq!(tasks["enabled"], false);
    assert_eq!(tasks["tools"].as_array().unwrap().len(), 3);
    assert_eq!(value["permissions"]["leads-server"]["enabled"], true);

    let table = get_agent(&api_client, &id, "table").await.unwrap();
    assert!(table.contains("leads-server"));
    assert!(table.contains("enabled: get_leads"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_revoke_without_grant_is_a_no_op() {
    let (url, _db) = test_server::spawn().await;
    let api_client = ApiClient::new(Some(url));
    let id = create(&api_client, "Planner").await;

    let output = revoke(&api_client, &id, "expenses-server").await.unwrap();

    assert!(output.contains("no grant"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_grant_unknown_module_fails() {
    let (url, _db) = test_server::spawn().await;
    let api_client = ApiClient::new(Some(url));
    let id = create(&api_client, "Planner").await;

    let err = grant(&api_client, &id, "billing-server", vec![])
        .await
        .unwrap_err();

    match err {
        CliError::ApiError { status, message, .. } => {
            assert_eq!(status, 400);
            assert!(message.contains("Unknown module"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_requires_force() {
    let (url, _db) = test_server::spawn().await;
    let api_client = ApiClient::new(Some(url));
    let id = create(&api_client, "Temp").await;

    let err = delete_agent(&api_client, &id, false).await.unwrap_err();
    assert!(matches!(err, CliError::InvalidInput { .. }));

    let output = delete_agent(&api_client, &id, true).await.unwrap();
    assert!(output.contains(&id));

    let err = get_agent(&api_client, &id, "table").await.unwrap_err();
    assert!(matches!(err, CliError::ApiError { status: 404, .. }));
}
