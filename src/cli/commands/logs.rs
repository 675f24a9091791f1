//! `crmhub logs`: browse the agent audit log.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::{Table, Tabled};

use crate::cli::api_client::ApiClient;
use crate::cli::error::CliResult;
use crate::cli::utils::{apply_table_style, truncate_with_ellipsis};

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentLog {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub module: String,
    pub action: String,
    pub result: String,
    pub user_context: Option<Value>,
    pub details: Option<Value>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
struct AgentLogListResponse {
    items: Vec<AgentLog>,
    total: usize,
}

/// Filters for `crmhub logs`
#[derive(Debug, Default)]
pub struct LogFilter<'a> {
    pub agent_id: Option<&'a str>,
    pub module: Option<&'a str>,
    pub result: Option<&'a str>,
    pub limit: Option<u32>,
}

#[derive(Tabled)]
pub(crate) struct AgentLogDisplay {
    #[tabled(rename = "Time")]
    pub(crate) created_at: String,
    #[tabled(rename = "Agent")]
    pub(crate) agent: String,
    #[tabled(rename = "Module")]
    pub(crate) module: String,
    #[tabled(rename = "Action")]
    pub(crate) action: String,
    #[tabled(rename = "Result")]
    pub(crate) result: String,
    #[tabled(rename = "Details")]
    pub(crate) details: String,
}

impl From<&AgentLog> for AgentLogDisplay {
    fn from(log: &AgentLog) -> Self {
        Self {
            created_at: log.created_at.clone(),
            agent: log.agent_name.clone(),
            module: log.module.clone(),
            action: log.action.clone(),
            result: log.result.clone(),
            details: log
                .details
                .as_ref()
                .map(|d| truncate_with_ellipsis(&d.to_string(), 60))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// List audit log rows, newest first
pub async fn list_logs(
    api_client: &ApiClient,
    filter: LogFilter<'_>,
    format: &str,
) -> CliResult<String> {
    let mut request = api_client.get("/api/v1/agent-logs");

    if let Some(agent_id) = filter.agent_id {
        request = request.query(&[("agent_id", agent_id)]);
    }
    if let Some(module) = filter.module {
        request = request.query(&[("module", module)]);
    }
    if let Some(result) = filter.result {
        request = request.query(&[("result", result)]);
    }
    if let Some(limit) = filter.limit {
        request = request.query(&[("limit", limit.to_string())]);
    }

    let response = request.send().await?;
    let page: AgentLogListResponse = ApiClient::handle_response(response).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&page.items)?),
        _ => Ok(format_table(&page.items, page.total)),
    }
}

pub(crate) fn format_table(logs: &[AgentLog], total: usize) -> String {
    if logs.is_empty() {
        return "No log entries found.".to_string();
    }

    let rows: Vec<AgentLogDisplay> = logs.iter().map(|l| l.into()).collect();
    let mut table = Table::new(rows);
    apply_table_style(&mut table);
    format!("{}\nShowing {} of {} entries", table, logs.len(), total)
}
