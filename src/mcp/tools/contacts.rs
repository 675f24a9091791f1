//! MCP tools for the contact book (`contacts-server`).

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

use crate::db::{Contact, ContactQuery, ContactRepository, Database, Page};
use crate::mcp::tools::{
    Module, ModuleTools, RECENT_LIMIT, apply_limit, deleted_result, json_result, map_db_error,
    patch, to_json,
};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetContactsParams {
    #[schemars(description = "Case-insensitive text search over name, email, phone and company")]
    pub search: Option<String>,
    #[schemars(description = "Filter by company (exact match)")]
    pub company: Option<String>,
    #[schemars(description = "Maximum number of contacts to return (default: 50, max: 100)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateContactParams {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateContactParams {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteContactParams {
    pub id: String,
}

pub struct ContactTools<D: Database> {
    db: Arc<D>,
    tool_router: ToolRouter<Self>,
}

impl<D: Database> Clone for ContactTools<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            tool_router: self.tool_router.clone(),
        }
    }
}

#[tool_router]
impl<D: Database + 'static> ContactTools<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "List contacts alphabetically. Filter by company or free-text search.")]
    pub async fn get_contacts(
        &self,
        params: Parameters<GetContactsParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let query = ContactQuery {
            page: apply_limit(params.limit),
            search: params.search,
            company: params.company,
        };

        let result = self.db.contacts().list(&query).await.map_err(map_db_error)?;
        json_result(&result)
    }

    #[tool(description = "Add a contact.")]
    pub async fn create_contact(
        &self,
        params: Parameters<CreateContactParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let contact = Contact {
            id: String::new(),
            name: params.name,
            email: params.email,
            phone: params.phone,
            company: params.company,
            address: params.address,
            notes: params.notes,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let created = self
            .db
            .contacts()
            .create(&contact)
            .await
            .map_err(map_db_error)?;
        json_result(&created)
    }

    #[tool(description = "Update a contact. Only the given fields change; empty strings clear.")]
    pub async fn update_contact(
        &self,
        params: Parameters<UpdateContactParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut contact = self
            .db
            .contacts()
            .get(&params.id)
            .await
            .map_err(map_db_error)?;

        if let Some(name) = params.name {
            contact.name = name;
        }
        patch(&mut contact.email, params.email);
        patch(&mut contact.phone, params.phone);
        patch(&mut contact.company, params.company);
        patch(&mut contact.address, params.address);
        patch(&mut contact.notes, params.notes);

        let updated = self
            .db
            .contacts()
            .update(&contact)
            .await
            .map_err(map_db_error)?;
        json_result(&updated)
    }

    #[tool(description = "Delete a contact. Linked tasks and appointments are kept but detached.")]
    pub async fn delete_contact(
        &self,
        params: Parameters<DeleteContactParams>,
    ) -> Result<CallToolResult, McpError> {
        self.db
            .contacts()
            .delete(&params.0.id)
            .await
            .map_err(map_db_error)?;
        deleted_result("contact", &params.0.id)
    }
}

impl<D: Database + 'static> ModuleTools<D> for ContactTools<D> {
    const MODULE: Module = Module::Contacts;

    fn new(db: Arc<D>) -> Self {
        ContactTools::new(db)
    }

    fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    async fn recent(&self, table: &str) -> Result<Option<Value>, McpError> {
        if table != "contacts" {
            return Ok(None);
        }
        let query = ContactQuery {
            page: Page::limit(Some(RECENT_LIMIT)),
            ..Default::default()
        };
        let result = self.db.contacts().list(&query).await.map_err(map_db_error)?;
        Ok(Some(to_json(&result.items)?))
    }
}
