//! V1 API handlers.

mod admin_users;
mod agent_logs;
mod agents;
mod auth;
mod expenses;
mod payments;

#[cfg(test)]
mod agent_logs_test;
#[cfg(test)]
mod agents_test;

pub use admin_users::*;
pub use agent_logs::*;
pub use agents::*;
pub use auth::*;
pub use expenses::*;
pub use payments::*;

use axum::{Json, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::DbError;

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "Agent not found")]
    pub error: String,
}

pub type ErrorReply = (StatusCode, Json<ErrorResponse>);

pub(crate) fn error_reply(status: StatusCode, error: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Map a storage error onto an HTTP status.
pub(crate) fn db_error(e: DbError) -> ErrorReply {
    let status = match &e {
        DbError::NotFound { .. } => StatusCode::NOT_FOUND,
        DbError::Validation { .. } | DbError::Constraint { .. } => StatusCode::BAD_REQUEST,
        DbError::AlreadyExists { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_reply(status, e.to_string())
}
