//! Database error types.
//!
//! Storage-backend agnostic errors, with miette diagnostics for the binaries
//! and thiserror for the derive.

use miette::Diagnostic;
use thiserror::Error;

/// Database operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Entity not found: {entity_type} with id '{id}'")]
    #[diagnostic(code(crmhub::db::not_found))]
    NotFound { entity_type: String, id: String },

    #[error("Entity already exists: {entity_type} with id '{id}'")]
    #[diagnostic(code(crmhub::db::already_exists))]
    AlreadyExists { entity_type: String, id: String },

    #[error("Validation error: {message}")]
    #[diagnostic(code(crmhub::db::validation_error))]
    Validation { message: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(crmhub::db::database_error))]
    Database { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(crmhub::db::migration_error))]
    Migration { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(crmhub::db::connection_error))]
    Connection { message: String },

    #[error("Constraint violation: {message}")]
    #[diagnostic(code(crmhub::db::constraint))]
    Constraint { message: String },
}

impl DbError {
    pub(crate) fn not_found(entity_type: &str, id: &str) -> Self {
        DbError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DbError::Validation {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                unique_violation(db_err.message())
            }
            sqlx::Error::Database(db_err)
                if db_err.is_foreign_key_violation() || db_err.is_check_violation() =>
            {
                DbError::Constraint {
                    message: db_err.message().to_string(),
                }
            }
            _ => DbError::Database {
                message: e.to_string(),
            },
        }
    }
}

/// SQLite reports `UNIQUE constraint failed: table.column`; the value itself is not included.
pub(crate) fn unique_violation(message: &str) -> DbError {
    let target = message
        .strip_prefix("UNIQUE constraint failed: ")
        .and_then(|rest| rest.split(',').next())
        .and_then(|first| first.trim().split_once('.'));
    match target {
        Some((table, column)) => DbError::AlreadyExists {
            entity_type: table.to_string(),
            id: column.to_string(),
        },
        None => DbError::AlreadyExists {
            entity_type: "record".to_string(),
            id: message.to_string(),
        },
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
