//! AI agent and permission management handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::db::{Agent, AgentPermissions, AgentRepository, Database, ModulePermission};
use crate::mcp::Module;

use super::{ErrorReply, ErrorResponse, db_error, error_reply};

// =============================================================================
// DTOs (Data Transfer Objects)
// =============================================================================

/// Agent response DTO
#[derive(Serialize, ToSchema)]
pub struct AgentResponse {
    /// Unique identifier (8-character hex)
    #[schema(example = "a1b2c3d4")]
    pub id: String,
    #[schema(example = "WhatsApp assistant")]
    pub name: String,
    pub description: Option<String>,
    /// Inactive agents are denied every tool
    pub is_active: bool,
    #[schema(example = "2026-01-01 00:00:00")]
    pub created_at: String,
}

impl From<Agent> for AgentResponse {
    fn from(a: Agent) -> Self {
        Self {
            id: a.id,
            name: a.name,
            description: a.description,
            is_active: a.is_active,
            created_at: a.created_at,
        }
    }
}

/// Create agent request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAgentRequest {
    #[schema(example = "WhatsApp assistant")]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

/// Grant on one module server
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModulePermissionBody {
    pub enabled: bool,
    /// Tool names the agent may call
    #[serde(default)]
    #[schema(example = json!(["get_tasks", "create_task"]))]
    pub tools: Vec<String>,
}

/// Permissions keyed by module server name (e.g. `tasks-server`)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PermissionsBody(pub BTreeMap<String, ModulePermissionBody>);

impl From<AgentPermissions> for PermissionsBody {
    fn from(p: AgentPermissions) -> Self {
        Self(
            p.into_iter()
                .map(|(module, grant)| {
                    (
                        module,
                        ModulePermissionBody {
                            enabled: grant.enabled,
                            tools: grant.tools,
                        },
                    )
                })
                .collect(),
        )
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List all agents
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "agents",
    responses(
        (status = 200, description = "All agents, newest first", body = [AgentResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_agents<D: Database>(
    State(state): State<AppState<D>>,
) -> Result<Json<Vec<AgentResponse>>, ErrorReply> {
    let agents = state.db().agents().list().await.map_err(db_error)?;
    Ok(Json(agents.into_iter().map(AgentResponse::from).collect()))
}

/// Get an agent by ID
#[utoipa::path(
    get,
    path = "/api/v1/agents/{id}",
    tag = "agents",
    params(("id" = String, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Agent found", body = AgentResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_agent<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<String>,
) -> Result<Json<AgentResponse>, ErrorReply> {
    let agent = state.db().agents().get(&id).await.map_err(db_error)?;
    Ok(Json(AgentResponse::from(agent)))
}

/// Register a new agent
///
/// The agent starts without permissions.
#[utoipa::path(
    post,
    path = "/api/v1/agents",
    tag = "agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created", body = AgentResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_agent<D: Database>(
    State(state): State<AppState<D>>,
    Json(req): Json<CreateAgentRequest>,
) -> Result<(StatusCode, Json<AgentResponse>), ErrorReply> {
    let agent = Agent {
        id: String::new(),
        name: req.name,
        description: req.description,
        is_active: req.is_active.unwrap_or(true),
        created_at: String::new(),
    };

    let created = state.db().agents().create(&agent).await.map_err(db_error)?;
    info!(agent_id = %created.id, name = %created.name, "Agent created");
    Ok((StatusCode::CREATED, Json(AgentResponse::from(created))))
}

/// Delete an agent
///
/// Its permissions go with it; its audit log rows are kept.
#[utoipa::path(
    delete,
    path = "/api/v1/agents/{id}",
    tag = "agents",
    params(("id" = String, Path, description = "Agent ID")),
    responses(
        (status = 204, description = "Agent deleted"),
        (status = 404, description = "Agent not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_agent<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ErrorReply> {
    state.db().agents().delete(&id).await.map_err(db_error)?;
    info!(agent_id = %id, "Agent deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Get an agent's permissions
#[utoipa::path(
    get,
    path = "/api/v1/agents/{id}/permissions",
    tag = "agents",
    params(("id" = String, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Permissions by module", body = PermissionsBody),
        (status = 404, description = "Agent not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_permissions<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<String>,
) -> Result<Json<PermissionsBody>, ErrorReply> {
    let permissions = state.db().agents().permissions(&id).await.map_err(db_error)?;
    Ok(Json(PermissionsBody::from(permissions)))
}

/// Replace an agent's permissions
///
/// Modules absent from the body lose all access.
#[utoipa::path(
    put,
    path = "/api/v1/agents/{id}/permissions",
    tag = "agents",
    params(("id" = String, Path, description = "Agent ID")),
    request_body = PermissionsBody,
    responses(
        (status = 200, description = "Permissions replaced", body = PermissionsBody),
        (status = 400, description = "Unknown module name", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn set_permissions<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<String>,
    Json(body): Json<PermissionsBody>,
) -> Result<Json<PermissionsBody>, ErrorReply> {
    let mut permissions = AgentPermissions::new();
    for (module, grant) in body.0 {
        module
            .parse::<Module>()
            .map_err(|e| error_reply(StatusCode::BAD_REQUEST, e))?;
        permissions.insert(
            module,
            ModulePermission {
                enabled: grant.enabled,
                tools: grant.tools,
            },
        );
    }

    let saved = state
        .db()
        .agents()
        .set_permissions(&id, &permissions)
        .await
        .map_err(db_error)?;
    info!(agent_id = %id, modules = saved.len(), "Permissions replaced");
    Ok(Json(PermissionsBody::from(saved)))
}
