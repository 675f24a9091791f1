//! MCP tools for expenses (`expenses-server`).

use rmcp::{
    ErrorData as McpError,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars,
    schemars::JsonSchema,
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::db::{
    Database, Expense, ExpenseQuery, ExpenseRepository, ExpenseStatus, Page,
};
use crate::mcp::tools::{
    Module, ModuleTools, RECENT_LIMIT, apply_limit, deleted_result, json_result, map_db_error,
    parse_opt, patch, to_json,
};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetExpensesParams {
    #[schemars(description = "Filter by status: pending, approved, rejected, paid")]
    pub status: Option<String>,
    #[schemars(description = "Filter by category (exact match)")]
    pub category: Option<String>,
    #[schemars(description = "Only expenses on or after this date (YYYY-MM-DD)")]
    pub date_from: Option<String>,
    #[schemars(description = "Only expenses on or before this date (YYYY-MM-DD)")]
    pub date_to: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    #[schemars(description = "Maximum number of expenses to return (default: 50, max: 100)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateExpenseParams {
    pub title: String,
    #[schemars(description = "Amount in rupees. Must be greater than 0.")]
    pub amount: f64,
    pub description: Option<String>,
    pub category: Option<String>,
    #[schemars(description = "Status (default: pending)")]
    pub status: Option<String>,
    #[schemars(description = "Date of the expense (YYYY-MM-DD, default: today)")]
    pub expense_date: Option<String>,
    pub payment_method: Option<String>,
    #[schemars(description = "Admin user ID who submitted the expense")]
    pub submitted_by: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateExpenseParams {
    #[schemars(description = "Expense ID (internal id or EXP001 form)")]
    pub id: String,
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub expense_date: Option<String>,
    pub payment_method: Option<String>,
    pub submitted_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteExpenseParams {
    #[schemars(description = "Expense ID (internal id or EXP001 form)")]
    pub id: String,
}

pub struct ExpenseTools<D: Database> {
    db: Arc<D>,
    tool_router: ToolRouter<Self>,
}

impl<D: Database> Clone for ExpenseTools<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            tool_router: self.tool_router.clone(),
        }
    }
}

#[tool_router]
impl<D: Database + 'static> ExpenseTools<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "List expenses, most recent expense date first. Filter by status, category, date range or amount range."
    )]
    pub async fn get_expenses(
        &self,
        params: Parameters<GetExpensesParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let query = ExpenseQuery {
            page: apply_limit(params.limit),
            status: parse_opt(params.status.as_deref())?,
            category: params.category,
            date_from: params.date_from,
            date_to: params.date_to,
            min_amount: params.min_amount,
            max_amount: params.max_amount,
        };

        let result = self.db.expenses().list(&query).await.map_err(map_db_error)?;
        json_result(&result)
    }

    #[tool(description = "Record an expense. An EXP001 style ID is assigned automatically.")]
    pub async fn create_expense(
        &self,
        params: Parameters<CreateExpenseParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let expense = Expense {
            id: String::new(),
            expense_id: String::new(),
            title: params.title,
            description: params.description,
            amount: params.amount,
            category: params.category,
            status: parse_opt::<ExpenseStatus>(params.status.as_deref())?.unwrap_or_default(),
            expense_date: params.expense_date.unwrap_or_default(),
            payment_method: params.payment_method,
            submitted_by: params.submitted_by,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let created = self
            .db
            .expenses()
            .create(&expense)
            .await
            .map_err(map_db_error)?;
        json_result(&created)
    }

    #[tool(description = "Update an expense, e.g. to approve or reject it. Only the given fields change.")]
    pub async fn update_expense(
        &self,
        params: Parameters<UpdateExpenseParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut expense = self
            .db
            .expenses()
            .get(&params.id)
            .await
            .map_err(map_db_error)?;

        if let Some(title) = params.title {
            expense.title = title;
        }
        if let Some(amount) = params.amount {
            expense.amount = amount;
        }
        if let Some(status) = parse_opt(params.status.as_deref())? {
            expense.status = status;
        }
        if let Some(expense_date) = params.expense_date {
            expense.expense_date = expense_date;
        }
        patch(&mut expense.description, params.description);
        patch(&mut expense.category, params.category);
        patch(&mut expense.payment_method, params.payment_method);
        patch(&mut expense.submitted_by, params.submitted_by);

        let updated = self
            .db
            .expenses()
            .update(&expense)
            .await
            .map_err(map_db_error)?;
        json_result(&updated)
    }

    #[tool(description = "Delete an expense permanently.")]
    pub async fn delete_expense(
        &self,
        params: Parameters<DeleteExpenseParams>,
    ) -> Result<CallToolResult, McpError> {
        self.db
            .expenses()
            .delete(&params.0.id)
            .await
            .map_err(map_db_error)?;
        deleted_result("expense", &params.0.id)
    }
}

impl<D: Database + 'static> ModuleTools<D> for ExpenseTools<D> {
    const MODULE: Module = Module::Expenses;

    fn new(db: Arc<D>) -> Self {
        ExpenseTools::new(db)
    }

    fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    async fn recent(&self, table: &str) -> Result<Option<Value>, McpError> {
        if table != "expenses" {
            return Ok(None);
        }
        let query = ExpenseQuery {
            page: Page::limit(Some(RECENT_LIMIT)),
            ..Default::default()
        };
        let result = self.db.expenses().list(&query).await.map_err(map_db_error)?;
        Ok(Some(to_json(&result.items)?))
    }
}
