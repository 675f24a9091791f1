//! Permission guard for MCP tool calls.
//!
//! Every `tools/call` on a module server runs through [`PermissionGuard::run`],
//! which authorizes the calling agent against its module grant, invokes the
//! tool and appends one row to the agent audit log.

use std::future::Future;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::db::{
    Agent, AgentLog, AgentLogRepository, AgentRepository, Database, DbError, LogResult,
};
use crate::mcp::tools::Module;

/// Argument every tool call must carry to identify the calling agent.
pub const AGENT_ID_ARG: &str = "agent_id";

/// Optional free-form argument copied into the audit log.
pub const USER_CONTEXT_ARG: &str = "user_context";

/// Build the JSON-RPC error returned for a failed call.
///
/// All failures use code -32603. `data.result` tells callers whether the call
/// was refused or failed.
pub fn call_error(result: LogResult, message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), Some(json!({ "result": result.as_str() })))
}

/// Authorizes and audits tool calls for one module.
pub struct PermissionGuard<D: Database> {
    db: Arc<D>,
    module: Module,
}

impl<D: Database> Clone for PermissionGuard<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            module: self.module,
        }
    }
}

impl<D: Database> PermissionGuard<D> {
    pub fn new(db: Arc<D>, module: Module) -> Self {
        Self { db, module }
    }

    pub fn module(&self) -> Module {
        self.module
    }

    /// Run `handler` on behalf of the agent named in `arguments`.
    pub async fn run<F, Fut>(
        &self,
        tool: &str,
        arguments: Option<&JsonObject>,
        handler: F,
    ) -> Result<CallToolResult, McpError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CallToolResult, McpError>>,
    {
        let module = self.module.name();

        let Some(agent_id) = arguments
            .and_then(|args| args.get(AGENT_ID_ARG))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            return Err(call_error(LogResult::Error, "agent_id is required"));
        };

        let agent = match self.db.agents().get(agent_id).await {
            Ok(agent) => agent,
            Err(DbError::NotFound { .. }) => {
                // Rows need a known agent name, so unknown callers are only traced.
                warn!(agent_id, module, tool, "Tool call from unknown agent");
                return Err(call_error(
                    LogResult::Error,
                    format!("Agent not found: {}", agent_id),
                ));
            }
            Err(e) => {
                error!(agent_id, module, tool, error = %e, "Agent lookup failed");
                return Err(call_error(LogResult::Error, e.to_string()));
            }
        };

        let user_context = arguments
            .and_then(|args| args.get(USER_CONTEXT_ARG))
            .filter(|v| !v.is_null())
            .cloned();

        let grant = match self.db.agents().module_permission(&agent.id, module).await {
            Ok(grant) => grant,
            Err(e) => {
                error!(agent_id, module, tool, error = %e, "Permission lookup failed");
                self.audit(&agent, tool, LogResult::Error, user_context, json!({ "error": e.to_string() }))
                    .await;
                return Err(call_error(LogResult::Error, e.to_string()));
            }
        };

        let allowed = agent.is_active && grant.as_ref().is_some_and(|g| g.allows(tool));
        if !allowed {
            let message = format!(
                "Permission denied: agent '{}' may not call '{}' on {}",
                agent.name, tool, module
            );
            warn!(agent_id, module, tool, "Tool call denied");
            self.audit(&agent, tool, LogResult::Denied, user_context, json!({ "error": message }))
                .await;
            return Err(call_error(LogResult::Denied, message));
        }

        match handler().await {
            Ok(result) => {
                debug!(agent_id, module, tool, "Tool call succeeded");
                let details = arguments.map(call_details).unwrap_or(Value::Null);
                self.audit(&agent, tool, LogResult::Success, user_context, details)
                    .await;
                Ok(result)
            }
            Err(e) => {
                let message = e.message.to_string();
                warn!(agent_id, module, tool, error = %message, "Tool call failed");
                self.audit(&agent, tool, LogResult::Error, user_context, json!({ "error": message }))
                    .await;
                Err(call_error(LogResult::Error, message))
            }
        }
    }

    /// Append an audit row. Failures are logged and otherwise ignored.
    async fn audit(
        &self,
        agent: &Agent,
        tool: &str,
        result: LogResult,
        user_context: Option<Value>,
        details: Value,
    ) {
        let log = AgentLog {
            id: String::new(),
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            module: self.module.name().to_string(),
            action: tool.to_string(),
            result,
            user_context,
            details: (!details.is_null()).then_some(details),
            created_at: String::new(),
        };

        if let Err(e) = self.db.agent_logs().append(&log).await {
            error!(
                agent_id = %agent.id,
                tool,
                error = %e,
                "Failed to write agent audit log"
            );
        }
    }
}

/// The call arguments as recorded in the audit log, minus the agent id.
fn call_details(arguments: &JsonObject) -> Value {
    let mut details = arguments.clone();
    details.remove(AGENT_ID_ARG);
    Value::Object(details)
}
