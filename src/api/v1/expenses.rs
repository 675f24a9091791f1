//! Standalone expense creation endpoint.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::db::{Database, Expense, ExpenseRepository, ExpenseStatus};

use super::{ErrorReply, ErrorResponse, db_error, error_reply};

/// Create expense request DTO
///
/// Fields are optional at the wire level so missing values get a 400 with
/// an error message instead of a deserialization rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateExpenseRequest {
    #[schema(example = "Courier charges")]
    pub title: Option<String>,
    /// Amount in rupees, greater than 0
    #[schema(example = 250.0)]
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub expense_date: Option<String>,
    pub payment_method: Option<String>,
    /// Admin user ID
    pub submitted_by: Option<String>,
}

/// Expense DTO
#[derive(Serialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: String,
    #[schema(example = "EXP001")]
    pub expense_id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub category: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub expense_date: String,
    pub payment_method: Option<String>,
    pub submitted_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Expense> for ExpenseResponse {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            expense_id: e.expense_id,
            title: e.title,
            description: e.description,
            amount: e.amount,
            category: e.category,
            status: e.status.as_str().to_string(),
            expense_date: e.expense_date,
            payment_method: e.payment_method,
            submitted_by: e.submitted_by,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Record an expense
#[utoipa::path(
    post,
    path = "/create-expense",
    tag = "expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = ExpenseResponse),
        (status = 400, description = "Missing title or non-positive amount", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_expense<D: Database>(
    State(state): State<AppState<D>>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), ErrorReply> {
    let Some(title) = req.title.filter(|t| !t.trim().is_empty()) else {
        return Err(error_reply(StatusCode::BAD_REQUEST, "title is required"));
    };
    let amount = match req.amount {
        Some(amount) if amount.is_finite() && amount > 0.0 => amount,
        _ => {
            warn!(amount = ?req.amount, "Rejected expense amount");
            return Err(error_reply(
                StatusCode::BAD_REQUEST,
                "amount must be greater than 0",
            ));
        }
    };

    let expense = Expense {
        id: String::new(),
        expense_id: String::new(),
        title,
        description: req.description,
        amount,
        category: req.category,
        status: ExpenseStatus::Pending,
        expense_date: req.expense_date.unwrap_or_default(),
        payment_method: req.payment_method,
        submitted_by: req.submitted_by,
        created_at: String::new(),
        updated_at: String::new(),
    };

    let created = state
        .db()
        .expenses()
        .create(&expense)
        .await
        .map_err(db_error)?;
    info!(expense_id = %created.expense_id, amount = created.amount, "Expense created");
    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(created))))
}
