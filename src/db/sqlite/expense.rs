//! SQLite ExpenseRepository implementation.

use std::str::FromStr;

use sqlx::{Row, SqlitePool};

use super::helpers::{Filter, build_limit_offset_clause, next_human_id};
use crate::db::utils::{current_date, current_timestamp, generate_entity_id, round_currency};
use crate::db::{
    DbError, DbResult, Expense, ExpenseQuery, ExpenseRepository, ExpenseStatus, ListResult,
};

const COLUMNS: &str = "id, expense_id, title, description, amount, category, status, expense_date, payment_method, submitted_by, created_at, updated_at";

pub struct SqliteExpenseRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

fn validate(expense: &Expense) -> DbResult<()> {
    if expense.title.trim().is_empty() {
        return Err(DbError::validation("title cannot be empty"));
    }
    if !expense.amount.is_finite() || expense.amount <= 0.0 {
        return Err(DbError::validation("amount must be greater than 0"));
    }
    Ok(())
}

impl<'a> ExpenseRepository for SqliteExpenseRepository<'a> {
    async fn create(&self, expense: &Expense) -> DbResult<Expense> {
        validate(expense)?;

        let id = if expense.id.is_empty() {
            generate_entity_id()
        } else {
            expense.id.clone()
        };
        let now = current_timestamp();
        let amount = round_currency(expense.amount);
        let expense_date = if expense.expense_date.is_empty() {
            current_date()
        } else {
            expense.expense_date.clone()
        };

        let mut tx = self.pool.begin().await?;
        let expense_id = next_human_id(&mut *tx, "expenses", "expense_id", "EXP", 3).await?;

        sqlx::query(
            r#"
            INSERT INTO expenses (id, expense_id, title, description, amount, category, status, expense_date, payment_method, submitted_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&expense_id)
        .bind(&expense.title)
        .bind(&expense.description)
        .bind(amount)
        .bind(&expense.category)
        .bind(expense.status.as_str())
        .bind(&expense_date)
        .bind(&expense.payment_method)
        .bind(&expense.submitted_by)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Expense {
            id,
            expense_id,
            amount,
            expense_date,
            created_at: now.clone(),
            updated_at: now,
            ..expense.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<Expense> {
        let sql = format!(
            "SELECT {} FROM expenses WHERE id = ? OR expense_id = ?",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| row_to_expense(&r))
            .ok_or_else(|| DbError::not_found("Expense", id))
    }

    async fn list(&self, query: &ExpenseQuery) -> DbResult<ListResult<Expense>> {
        let mut filter = Filter::new();
        filter
            .eq("status", query.status.map(|s| s.as_str()))
            .eq("category", query.category.clone())
            .compare("expense_date", ">=", query.date_from.clone())
            .compare("expense_date", "<=", query.date_to.clone())
            .compare("amount", ">=", query.min_amount)
            .compare("amount", "<=", query.max_amount);

        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM expenses {} ORDER BY expense_date DESC, rowid DESC{}",
            COLUMNS,
            where_clause,
            build_limit_offset_clause(&query.page)
        );
        let count_sql = format!("SELECT COUNT(*) FROM expenses {}", where_clause);

        let rows = filter.bind_query(sqlx::query(&sql)).fetch_all(self.pool).await?;
        let total: i64 = filter
            .bind_scalar(sqlx::query_scalar(&count_sql))
            .fetch_one(self.pool)
            .await?;

        Ok(ListResult {
            items: rows.iter().map(row_to_expense).collect(),
            total: total as usize,
            limit: query.page.effective_limit(),
            offset: query.page.offset.unwrap_or(0),
        })
    }

    async fn update(&self, expense: &Expense) -> DbResult<Expense> {
        validate(expense)?;

        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET title = ?, description = ?, amount = ?, category = ?, status = ?,
                expense_date = ?, payment_method = ?, submitted_by = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&expense.title)
        .bind(&expense.description)
        .bind(round_currency(expense.amount))
        .bind(&expense.category)
        .bind(expense.status.as_str())
        .bind(&expense.expense_date)
        .bind(&expense.payment_method)
        .bind(&expense.submitted_by)
        .bind(current_timestamp())
        .bind(&expense.id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", &expense.id));
        }

        self.get(&expense.id).await
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? OR expense_id = ?")
            .bind(id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}

fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Expense {
    Expense {
        id: row.get("id"),
        expense_id: row.get("expense_id"),
        title: row.get("title"),
        description: row.get("description"),
        amount: row.get("amount"),
        category: row.get("category"),
        status: ExpenseStatus::from_str(row.get("status")).unwrap_or_default(),
        expense_date: row.get("expense_date"),
        payment_method: row.get("payment_method"),
        submitted_by: row.get("submitted_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
