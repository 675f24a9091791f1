//! MCP tools for sales leads (`leads-server`).

use rmcp::{
    ErrorData as McpError,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars,
    schemars::JsonSchema,
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::db::{Database, Lead, LeadQuery, LeadRepository, LeadStatus, Page};
use crate::mcp::tools::{
    Module, ModuleTools, RECENT_LIMIT, apply_limit, deleted_result, json_result, map_db_error,
    parse_opt, patch, to_json,
};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetLeadsParams {
    #[schemars(description = "Filter by status: new, contacted, qualified, proposal, won, lost")]
    pub status: Option<String>,
    #[schemars(description = "Filter by source, e.g. website or referral")]
    pub source: Option<String>,
    pub assigned_to: Option<String>,
    #[schemars(description = "Maximum number of leads to return (default: 50, max: 100)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateLeadParams {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    #[schemars(description = "Status (default: new)")]
    pub status: Option<String>,
    pub estimated_value: Option<f64>,
    pub notes: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateLeadParams {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub estimated_value: Option<f64>,
    pub notes: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteLeadParams {
    pub id: String,
}

pub struct LeadTools<D: Database> {
    db: Arc<D>,
    tool_router: ToolRouter<Self>,
}

impl<D: Database> Clone for LeadTools<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            tool_router: self.tool_router.clone(),
        }
    }
}

#[tool_router]
impl<D: Database + 'static> LeadTools<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "List leads, newest first. Filter by status, source or assignee.")]
    pub async fn get_leads(
        &self,
        params: Parameters<GetLeadsParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let query = LeadQuery {
            page: apply_limit(params.limit),
            status: parse_opt(params.status.as_deref())?,
            source: params.source,
            assigned_to: params.assigned_to,
        };

        let result = self.db.leads().list(&query).await.map_err(map_db_error)?;
        json_result(&result)
    }

    #[tool(description = "Create a lead.")]
    pub async fn create_lead(
        &self,
        params: Parameters<CreateLeadParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let lead = Lead {
            id: String::new(),
            name: params.name,
            email: params.email,
            phone: params.phone,
            company: params.company,
            source: params.source,
            status: parse_opt::<LeadStatus>(params.status.as_deref())?.unwrap_or_default(),
            estimated_value: params.estimated_value,
            notes: params.notes,
            assigned_to: params.assigned_to,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let created = self.db.leads().create(&lead).await.map_err(map_db_error)?;
        json_result(&created)
    }

    #[tool(description = "Update a lead, e.g. to move it along the pipeline. Only the given fields change.")]
    pub async fn update_lead(
        &self,
        params: Parameters<UpdateLeadParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut lead = self.db.leads().get(&params.id).await.map_err(map_db_error)?;

        if let Some(name) = params.name {
            lead.name = name;
        }
        if let Some(status) = parse_opt(params.status.as_deref())? {
            lead.status = status;
        }
        if let Some(value) = params.estimated_value {
            lead.estimated_value = Some(value);
        }
        patch(&mut lead.email, params.email);
        patch(&mut lead.phone, params.phone);
        patch(&mut lead.company, params.company);
        patch(&mut lead.source, params.source);
        patch(&mut lead.notes, params.notes);
        patch(&mut lead.assigned_to, params.assigned_to);

        let updated = self.db.leads().update(&lead).await.map_err(map_db_error)?;
        json_result(&updated)
    }

    #[tool(description = "Delete a lead permanently.")]
    pub async fn delete_lead(
        &self,
        params: Parameters<DeleteLeadParams>,
    ) -> Result<CallToolResult, McpError> {
        self.db
            .leads()
            .delete(&params.0.id)
            .await
            .map_err(map_db_error)?;
        deleted_result("lead", &params.0.id)
    }
}

impl<D: Database + 'static> ModuleTools<D> for LeadTools<D> {
    const MODULE: Module = Module::Leads;

    fn new(db: Arc<D>) -> Self {
        LeadTools::new(db)
    }

    fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    async fn recent(&self, table: &str) -> Result<Option<Value>, McpError> {
        if table != "leads" {
            return Ok(None);
        }
        let query = LeadQuery {
            page: Page::limit(Some(RECENT_LIMIT)),
            ..Default::default()
        };
        let result = self.db.leads().list(&query).await.map_err(map_db_error)?;
        Ok(Some(to_json(&result.items)?))
    }
}
