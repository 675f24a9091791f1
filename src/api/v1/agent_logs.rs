//! Agent audit log handler.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::db::{AgentLog, AgentLogQuery, AgentLogRepository, Database, LogResult, Page};

use super::{ErrorReply, ErrorResponse, db_error, error_reply};

/// Audit log row DTO
#[derive(Serialize, ToSchema)]
pub struct AgentLogResponse {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    /// Module server name
    #[schema(example = "tasks-server")]
    pub module: String,
    /// Tool name
    #[schema(example = "create_task")]
    pub action: String,
    /// Success, Denied or Error
    #[schema(example = "Success")]
    pub result: String,
    pub user_context: Option<Value>,
    pub details: Option<Value>,
    pub created_at: String,
}

impl From<AgentLog> for AgentLogResponse {
    fn from(l: AgentLog) -> Self {
        Self {
            id: l.id,
            agent_id: l.agent_id,
            agent_name: l.agent_name,
            module: l.module,
            action: l.action,
            result: l.result.as_str().to_string(),
            user_context: l.user_context,
            details: l.details,
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAgentLogsQuery {
    /// Only rows for this agent
    pub agent_id: Option<String>,
    /// Only rows for this module server
    #[param(example = "tasks-server")]
    pub module: Option<String>,
    /// Success, Denied or Error
    pub result: Option<String>,
    /// Maximum number of items to return
    #[param(example = 50)]
    pub limit: Option<usize>,
    /// Number of items to skip
    #[param(example = 0)]
    pub offset: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedAgentLogs {
    pub items: Vec<AgentLogResponse>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// List audit log rows, newest first
#[utoipa::path(
    get,
    path = "/api/v1/agent-logs",
    tag = "agents",
    params(ListAgentLogsQuery),
    responses(
        (status = 200, description = "Paginated audit log", body = PaginatedAgentLogs),
        (status = 400, description = "Invalid result filter", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_agent_logs<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<ListAgentLogsQuery>,
) -> Result<Json<PaginatedAgentLogs>, ErrorReply> {
    let result = query
        .result
        .as_deref()
        .map(|r| r.parse::<LogResult>())
        .transpose()
        .map_err(|e| error_reply(StatusCode::BAD_REQUEST, e))?;

    let db_query = AgentLogQuery {
        page: Page {
            limit: query.limit,
            offset: query.offset,
        },
        agent_id: query.agent_id,
        module: query.module,
        result,
    };

    let logs = state
        .db()
        .agent_logs()
        .list(&db_query)
        .await
        .map_err(db_error)?;

    Ok(Json(PaginatedAgentLogs {
        items: logs.items.into_iter().map(AgentLogResponse::from).collect(),
        total: logs.total,
        limit: logs.limit,
        offset: logs.offset,
    }))
}
