//! Admin user handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::db::{AdminUser, AdminUserRepository, Database};

use super::{ErrorReply, ErrorResponse, db_error, error_reply};

/// Admin user DTO
#[derive(Serialize, ToSchema)]
pub struct AdminUserResponse {
    pub id: String,
    #[schema(example = "Priya Sharma")]
    pub name: String,
    pub email: Option<String>,
    /// Login mobile number, unique
    #[schema(example = "+919812345678")]
    pub mobile: String,
    #[schema(example = "admin")]
    pub role: String,
    pub created_at: String,
}

impl From<AdminUser> for AdminUserResponse {
    fn from(u: AdminUser) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            mobile: u.mobile,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAdminUserRequest {
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    /// Defaults to "admin"
    pub role: Option<String>,
}

/// List admin users by name
#[utoipa::path(
    get,
    path = "/api/v1/admin-users",
    tag = "admin-users",
    responses(
        (status = 200, description = "All admin users", body = [AdminUserResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_admin_users<D: Database>(
    State(state): State<AppState<D>>,
) -> Result<Json<Vec<AdminUserResponse>>, ErrorReply> {
    let users = state.db().admin_users().list().await.map_err(db_error)?;
    Ok(Json(users.into_iter().map(AdminUserResponse::from).collect()))
}

/// Create an admin user
#[utoipa::path(
    post,
    path = "/api/v1/admin-users",
    tag = "admin-users",
    request_body = CreateAdminUserRequest,
    responses(
        (status = 201, description = "Admin user created", body = AdminUserResponse),
        (status = 400, description = "Missing name or mobile", body = ErrorResponse),
        (status = 409, description = "Mobile already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_admin_user<D: Database>(
    State(state): State<AppState<D>>,
    Json(req): Json<CreateAdminUserRequest>,
) -> Result<(StatusCode, Json<AdminUserResponse>), ErrorReply> {
    if req.name.trim().is_empty() || req.mobile.trim().is_empty() {
        return Err(error_reply(
            StatusCode::BAD_REQUEST,
            "name and mobile are required",
        ));
    }

    let user = AdminUser {
        id: String::new(),
        name: req.name,
        email: req.email,
        mobile: req.mobile.trim().to_string(),
        role: req.role.unwrap_or_default(),
        created_at: String::new(),
    };

    let created = state
        .db()
        .admin_users()
        .create(&user)
        .await
        .map_err(db_error)?;
    info!(user_id = %created.id, "Admin user created");
    Ok((StatusCode::CREATED, Json(AdminUserResponse::from(created))))
}
