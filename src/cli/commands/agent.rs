//! `crmhub agent` commands: agents and their module grants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled, builder::Builder};

use crate::cli::api_client::ApiClient;
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{apply_table_style, format_optional, format_tools, truncate_with_ellipsis};

#[derive(Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleGrant {
    pub enabled: bool,
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Grants keyed by module server name
pub type Permissions = BTreeMap<String, ModuleGrant>;

#[derive(Debug, Serialize)]
pub struct CreateAgentRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Tabled)]
pub(crate) struct AgentDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Active")]
    pub(crate) active: String,
    #[tabled(rename = "Description")]
    pub(crate) description: String,
}

impl From<&Agent> for AgentDisplay {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            name: truncate_with_ellipsis(&agent.name, 40),
            active: if agent.is_active { "yes" } else { "no" }.to_string(),
            description: truncate_with_ellipsis(
                &format_optional(agent.description.as_deref()),
                50,
            ),
        }
    }
}

pub(crate) fn format_table(agents: &[Agent]) -> String {
    if agents.is_empty() {
        return "No agents found.".to_string();
    }

    let rows: Vec<AgentDisplay> = agents.iter().map(|a| a.into()).collect();
    let mut table = Table::new(rows);
    apply_table_style(&mut table);
    table.to_string()
}

fn permissions_path(id: &str) -> String {
    format!("/api/v1/agents/{}/permissions", id)
}

async fn fetch_permissions(api_client: &ApiClient, id: &str) -> CliResult<Permissions> {
    let response = api_client.get(&permissions_path(id)).send().await?;
    ApiClient::handle_response(response).await
}

async fn store_permissions(
    api_client: &ApiClient,
    id: &str,
    permissions: &Permissions,
) -> CliResult<Permissions> {
    let response = api_client
        .put(&permissions_path(id))
        .json(permissions)
        .send()
        .await?;
    ApiClient::handle_response(response).await
}

/// List all agents
pub async fn list_agents(api_client: &ApiClient, format: &str) -> CliResult<String> {
    let response = api_client.get("/api/v1/agents").send().await?;
    let agents: Vec<Agent> = ApiClient::handle_response(response).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&agents)?),
        _ => Ok(format_table(&agents)),
    }
}

/// Show one agent together with its permissions
pub async fn get_agent(api_client: &ApiClient, id: &str, format: &str) -> CliResult<String> {
    let response = api_client
        .get(&format!("/api/v1/agents/{}", id))
        .send()
        .await?;
    let agent: Agent = ApiClient::handle_response(response).await?;
    let permissions = fetch_permissions(api_client, id).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "agent": agent,
            "permissions": permissions,
        }))?),
        _ => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            builder.push_record(["ID", &agent.id]);
            builder.push_record(["Name", &agent.name]);
            builder.push_record(["Description", &format_optional(agent.description.as_deref())]);
            builder.push_record(["Active", if agent.is_active { "yes" } else { "no" }]);
            builder.push_record(["Created", &agent.created_at]);
            for (module, grant) in &permissions {
                let state = if grant.enabled { "enabled" } else { "disabled" };
                builder.push_record([
                    module.as_str(),
                    &format!("{}: {}", state, format_tools(&grant.tools)),
                ]);
            }

            let mut table = builder.build();
            apply_table_style(&mut table);
            Ok(table.to_string())
        }
    }
}

/// Register a new agent
pub async fn create_agent(api_client: &ApiClient, request: CreateAgentRequest) -> CliResult<String> {
    let response = api_client
        .post("/api/v1/agents")
        .json(&request)
        .send()
        .await?;

    let agent: Agent = ApiClient::handle_response(response).await?;
    Ok(format!("✓ Created agent: {} ({})", agent.name, agent.id))
}

/// Delete an agent (requires --force flag for safety)
pub async fn delete_agent(api_client: &ApiClient, id: &str, force: bool) -> CliResult<String> {
    if !force {
        return Err(CliError::InvalidInput {
            message: "Delete operation requires --force flag. The agent and its permissions are removed; its audit log is kept.".to_string(),
        });
    }

    let response = api_client
        .delete(&format!("/api/v1/agents/{}", id))
        .send()
        .await?;
    ApiClient::handle_empty(response).await?;
    Ok(format!("✓ Deleted agent: {}", id))
}

/// Enable a module for an agent and add tools to its allow-list
pub async fn grant(
    api_client: &ApiClient,
    id: &str,
    module: &str,
    tools: Vec<String>,
) -> CliResult<String> {
    let mut permissions = fetch_permissions(api_client, id).await?;

    let entry = permissions.entry(module.to_string()).or_default();
    entry.enabled = true;
    for tool in tools {
        if !entry.tools.contains(&tool) {
            entry.tools.push(tool);
        }
    }

    let saved = store_permissions(api_client, id, &permissions).await?;
    let tools = saved
        .get(module)
        .map(|g| format_tools(&g.tools))
        .unwrap_or_else(|| "-".to_string());
    Ok(format!("✓ Granted {} on {}: {}", id, module, tools))
}

/// Disable a module for an agent, keeping its tool list
pub async fn revoke(api_client: &ApiClient, id: &str, module: &str) -> CliResult<String> {
    let mut permissions = fetch_permissions(api_client, id).await?;

    let Some(entry) = permissions.get_mut(module) else {
        return Ok(format!("Agent {} has no grant on {}", id, module));
    };
    entry.enabled = false;

    store_permissions(api_client, id, &permissions).await?;
    Ok(format!("✓ Revoked {} on {}", id, module))
}
