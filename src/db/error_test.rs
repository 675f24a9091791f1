//! Tests for database error types.

use crate::db::error::unique_violation;
use crate::db::{DbError, DbResult};

#[test]
fn not_found_error_displays_correctly() {
    let err = DbError::NotFound {
        entity_type: "Task".to_string(),
        id: "TASK-0001".to_string(),
    };
    assert_eq!(err.to_string(), "Entity not found: Task with id 'TASK-0001'");
}

#[test]
fn already_exists_error_displays_correctly() {
    let err = DbError::AlreadyExists {
        entity_type: "AdminUser".to_string(),
        id: "9876543210".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Entity already exists: AdminUser with id '9876543210'"
    );
}

#[test]
fn validation_error_displays_correctly() {
    let err = DbError::validation("amount must be greater than 0");
    assert_eq!(
        err.to_string(),
        "Validation error: amount must be greater than 0"
    );
}

#[test]
fn constraint_error_displays_correctly() {
    let err = DbError::Constraint {
        message: "FOREIGN KEY constraint failed".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Constraint violation: FOREIGN KEY constraint failed"
    );
}

#[test]
fn sqlx_row_not_found_maps_to_database_error() {
    let err: DbError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, DbError::Database { .. }));
}

#[test]
fn db_result_err_returns_error() {
    let result: DbResult<i32> = Err(DbError::not_found("Expense", "EXP001"));
    assert!(result.is_err());
}

#[test]
fn unique_violation_names_table_and_column() {
    let err = unique_violation("UNIQUE constraint failed: invoices.invoice_number");
    assert_eq!(
        err.to_string(),
        "Entity already exists: invoices with id 'invoice_number'"
    );
}

#[test]
fn unparseable_unique_violation_still_already_exists() {
    let err = unique_violation("constraint failed");
    assert!(matches!(err, DbError::AlreadyExists { .. }));
}
