//! MCP tool implementations
//!
//! One tool set per CRM module. Each set owns a `ToolRouter` built by
//! `#[tool_router]` and is generic over `D: Database`, so the server can
//! serve any module through the same permission guard.

mod appointments;
mod contacts;
mod expenses;
mod leads;
mod tasks;

#[cfg(test)]
mod leads_test;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    handler::server::router::tool::ToolRouter,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::db::{Database, DbError, Page};

pub use appointments::AppointmentTools;
pub use contacts::ContactTools;
pub use expenses::{CreateExpenseParams, ExpenseTools};
pub use leads::LeadTools;
pub use tasks::TaskTools;

/// Number of rows served by the `crm://<table>/recent` resources.
pub const RECENT_LIMIT: usize = 10;

/// A CRM module exposed as its own MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Tasks,
    Expenses,
    Appointments,
    Leads,
    Contacts,
}

impl Module {
    pub const ALL: [Module; 5] = [
        Module::Tasks,
        Module::Expenses,
        Module::Appointments,
        Module::Leads,
        Module::Contacts,
    ];

    /// Server name, also the key used in agent permissions.
    pub fn name(&self) -> &'static str {
        match self {
            Module::Tasks => "tasks-server",
            Module::Expenses => "expenses-server",
            Module::Appointments => "appointments-server",
            Module::Leads => "leads-server",
            Module::Contacts => "contacts-server",
        }
    }

    /// Tables with a `crm://<table>/recent` resource.
    pub fn tables(&self) -> &'static [&'static str] {
        match self {
            Module::Tasks => &["tasks", "recurring_tasks"],
            Module::Expenses => &["expenses"],
            Module::Appointments => &["appointments"],
            Module::Leads => &["leads"],
            Module::Contacts => &["contacts"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Module::Tasks => "Manage one-off and recurring tasks",
            Module::Expenses => "Record and review business expenses",
            Module::Appointments => "Schedule and track appointments",
            Module::Leads => "Track sales leads through the pipeline",
            Module::Contacts => "Maintain the customer contact book",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Module::ALL.iter().map(|m| m.name()).collect();
                format!(
                    "Unknown module: '{}' (expected one of: {})",
                    s,
                    names.join(", ")
                )
            })
    }
}

/// A module's tool set, as served by [`crate::mcp::McpServer`].
pub trait ModuleTools<D: Database>: Clone + Send + Sync + Sized + 'static {
    const MODULE: Module;

    fn new(db: Arc<D>) -> Self;

    fn router(&self) -> &ToolRouter<Self>;

    /// The most recent rows of `table`, or `None` if this module does not
    /// own that table.
    fn recent(&self, table: &str) -> impl Future<Output = Result<Option<Value>, McpError>> + Send;
}

/// Map a database error onto an MCP error.
pub(crate) fn map_db_error(e: DbError) -> McpError {
    match e {
        DbError::NotFound { .. } => McpError::resource_not_found(e.to_string(), None),
        DbError::Validation { .. } | DbError::Constraint { .. } | DbError::AlreadyExists { .. } => {
            McpError::invalid_params(e.to_string(), None)
        }
        _ => McpError::internal_error(e.to_string(), None),
    }
}

/// Page for a `get_*` tool: default 50, capped at 100.
pub(crate) fn apply_limit(limit: Option<usize>) -> Page {
    Page::limit(limit)
}

/// Parse an optional enum argument such as `status` or `priority`.
pub(crate) fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, McpError>
where
    T: FromStr<Err = String>,
{
    value
        .map(|v| v.parse::<T>().map_err(|e| McpError::invalid_params(e, None)))
        .transpose()
}

/// Apply an optional text patch. An empty string clears the field.
pub(crate) fn patch(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *target = if value.is_empty() { None } else { Some(value) };
    }
}

/// Serialize a value as the text content of a successful tool result.
pub(crate) fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

pub(crate) fn deleted_result(kind: &str, id: &str) -> Result<CallToolResult, McpError> {
    json_result(&json!({ "deleted": true, "type": kind, "id": id }))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, McpError> {
    serde_json::to_value(value)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize: {}", e), None))
}
