//! MCP server implementation
//!
//! One `McpServer` serves a single CRM module. Tool calls go through the
//! module's [`PermissionGuard`]; resources and prompts are read-only views.

use std::marker::PhantomData;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolCallContext,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, GetPromptRequestParam,
        GetPromptResult, JsonObject, ListPromptsResult, ListResourcesResult, ListToolsResult,
        PaginatedRequestParam, Prompt, PromptMessage, PromptMessageRole, RawResource,
        ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer},
};
use serde_json::{Value, json};

use crate::db::Database;

use super::guard::{AGENT_ID_ARG, PermissionGuard};
use super::tools::{ModuleTools, RECENT_LIMIT};

/// MCP server for one module.
///
/// Generic over `D: Database` and the module's tool set, so each module
/// server is a distinct type with static dispatch.
pub struct McpServer<D: Database, T: ModuleTools<D>> {
    tools: T,
    guard: PermissionGuard<D>,
    _db: PhantomData<fn() -> D>,
}

impl<D: Database, T: ModuleTools<D>> Clone for McpServer<D, T> {
    fn clone(&self) -> Self {
        Self {
            tools: self.tools.clone(),
            guard: self.guard.clone(),
            _db: PhantomData,
        }
    }
}

impl<D: Database + 'static, T: ModuleTools<D>> McpServer<D, T> {
    pub fn new(db: impl Into<Arc<D>>) -> Self {
        let db = db.into();
        Self {
            tools: T::new(Arc::clone(&db)),
            guard: PermissionGuard::new(db, T::MODULE),
            _db: PhantomData,
        }
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn guard(&self) -> &PermissionGuard<D> {
        &self.guard
    }

    /// Tools of this module, each requiring `agent_id`.
    pub fn tool_list(&self) -> Vec<Tool> {
        self.tools
            .router()
            .list_all()
            .into_iter()
            .map(with_agent_id)
            .collect()
    }

    pub fn resource_list(&self) -> Vec<Resource> {
        T::MODULE
            .tables()
            .iter()
            .map(|table| {
                let mut raw = RawResource::new(recent_uri(table), format!("Recent {}", table));
                raw.description = Some(format!(
                    "The {} most recently created rows of {}",
                    RECENT_LIMIT, table
                ));
                raw.mime_type = Some("application/json".to_string());
                raw.no_annotation()
            })
            .collect()
    }

    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        let table = uri
            .strip_prefix("crm://")
            .and_then(|rest| rest.strip_suffix("/recent"))
            .ok_or_else(|| unknown_resource(uri))?;

        let rows = self
            .tools
            .recent(table)
            .await?
            .ok_or_else(|| unknown_resource(uri))?;
        let text = serde_json::to_string_pretty(&rows)
            .map_err(|e| McpError::internal_error(format!("Failed to serialize: {}", e), None))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }

    pub fn prompt_name(&self) -> String {
        format!("{}-overview", T::MODULE.name().trim_end_matches("-server"))
    }

    pub fn prompt_list(&self) -> Vec<Prompt> {
        vec![Prompt::new(
            self.prompt_name(),
            Some(format!("How to use the {} tools", T::MODULE.name())),
            None,
        )]
    }

    pub fn prompt(&self, name: &str) -> Result<GetPromptResult, McpError> {
        if name != self.prompt_name() {
            return Err(McpError::invalid_params(
                format!("Unknown prompt: {}", name),
                None,
            ));
        }

        let mut text = format!(
            "You are connected to {} ({}).\n\nEvery tool call must include an `{}` argument \
             identifying you; calls are checked against your permissions and recorded in the \
             audit log. You may add a `user_context` argument describing who you act for.\n\nTools:\n",
            T::MODULE.name(),
            T::MODULE.description(),
            AGENT_ID_ARG
        );
        for tool in self.tools.router().list_all() {
            let description = tool.description.as_deref().unwrap_or_default();
            text.push_str(&format!("- {}: {}\n", tool.name, description));
        }

        Ok(GetPromptResult {
            description: Some(T::MODULE.description().to_string()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
        })
    }
}

impl<D: Database + 'static, T: ModuleTools<D>> ServerHandler for McpServer<D, T> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            instructions: Some(format!(
                "CRM {} - {}. Pass agent_id with every tool call.",
                T::MODULE.name(),
                T::MODULE.description()
            )),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_list()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = request.name.to_string();
        let arguments = request.arguments.clone();

        self.guard
            .run(&tool, arguments.as_ref(), || {
                let call = ToolCallContext::new(&self.tools, request, context);
                self.tools.router().call(call)
            })
            .await
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(self.resource_list()))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read(&request.uri).await
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(self.prompt_list()))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        self.prompt(&request.name)
    }
}

pub fn recent_uri(table: &str) -> String {
    format!("crm://{}/recent", table)
}

fn unknown_resource(uri: &str) -> McpError {
    McpError::resource_not_found(
        format!("Unknown resource: {}", uri),
        Some(json!({ "uri": uri })),
    )
}

/// Add a required `agent_id` string property to a tool's input schema.
fn with_agent_id(mut tool: Tool) -> Tool {
    let mut schema: JsonObject = (*tool.input_schema).clone();

    let properties = schema
        .entry("properties")
        .or_insert_with(|| Value::Object(JsonObject::new()));
    if let Value::Object(properties) = properties {
        properties.insert(
            AGENT_ID_ARG.to_string(),
            json!({
                "type": "string",
                "description": "ID of the calling AI agent"
            }),
        );
    }

    let required = schema
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(required) = required
        && !required.iter().any(|r| r == AGENT_ID_ARG)
    {
        required.push(Value::String(AGENT_ID_ARG.to_string()));
    }

    tool.input_schema = Arc::new(schema);
    tool
}
