//! Tests for Lead MCP tools

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, ErrorCode, RawContent};
use serde_json::Value;

use crate::db::{Database, SqliteDatabase};
use crate::mcp::tools::leads::{
    CreateLeadParams, DeleteLeadParams, GetLeadsParams, LeadTools, UpdateLeadParams,
};

async fn setup() -> LeadTools<SqliteDatabase> {
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    LeadTools::new(Arc::new(db))
}

fn parse(result: &CallToolResult) -> Value {
    let text = match &result.content[0].raw {
        RawContent::Text(text) => text.text.as_str(),
        _ => panic!("Expected text content"),
    };
    serde_json::from_str(text).unwrap()
}

fn lead(name: &str, source: &str) -> CreateLeadParams {
    CreateLeadParams {
        name: name.to_string(),
        source: Some(source.to_string()),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lead_pipeline() {
    let tools = setup().await;

    let created = parse(
        &tools
            .create_lead(Parameters(CreateLeadParams {
                estimated_value: Some(50000.0),
                ..lead("Acme Traders", "website")
            }))
            .await
            .unwrap(),
    );
    assert_eq!(created["status"], "new");
    let id = created["id"].as_str().unwrap().to_string();

    let updated = parse(
        &tools
            .update_lead(Parameters(UpdateLeadParams {
                id: id.clone(),
                status: Some("qualified".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap(),
    );
    assert_eq!(updated["status"], "qualified");
    assert_eq!(updated["estimated_value"], 50000.0);

    let json = parse(
        &tools
            .delete_lead(Parameters(DeleteLeadParams { id: id.clone() }))
            .await
            .unwrap(),
    );
    assert_eq!(json["type"], "lead");
    assert_eq!(json["id"], id);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_leads_filters() {
    let tools = setup().await;
    tools
        .create_lead(Parameters(lead("Acme", "website")))
        .await
        .unwrap();
    tools
        .create_lead(Parameters(lead("Globex", "referral")))
        .await
        .unwrap();
    tools
        .create_lead(Parameters(CreateLeadParams {
            status: Some("won".to_string()),
            ..lead("Initech", "website")
        }))
        .await
        .unwrap();

    let json = parse(
        &tools
            .get_leads(Parameters(GetLeadsParams {
                source: Some("website".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap(),
    );
    assert_eq!(json["total"], 2);

    let json = parse(
        &tools
            .get_leads(Parameters(GetLeadsParams {
                status: Some("new".to_string()),
                source: Some("website".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap(),
    );
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["name"], "Acme");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_lead_input() {
    let tools = setup().await;

    let err = tools
        .create_lead(Parameters(CreateLeadParams {
            estimated_value: Some(-1.0),
            ..lead("Negative", "website")
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

    let err = tools
        .create_lead(Parameters(CreateLeadParams {
            status: Some("maybe".to_string()),
            ..lead("Unknown", "website")
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
}
