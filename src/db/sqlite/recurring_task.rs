//! SQLite RecurringTaskRepository implementation.

use std::str::FromStr;

use sqlx::{Row, SqlitePool};

use super::helpers::{Filter, build_limit_offset_clause, next_human_id};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{
    DbError, DbResult, Frequency, ListResult, Priority, RecurringTask, RecurringTaskQuery,
    RecurringTaskRepository,
};

const COLUMNS: &str = "id, task_id, title, description, frequency, priority, assigned_to, start_date, end_date, next_due_date, is_active, created_at, updated_at";

pub struct SqliteRecurringTaskRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

fn validate(task: &RecurringTask) -> DbResult<()> {
    if task.title.trim().is_empty() {
        return Err(DbError::validation("title cannot be empty"));
    }
    if let Some(end) = &task.end_date
        && end.as_str() < task.start_date.as_str()
    {
        return Err(DbError::validation("end_date cannot be before start_date"));
    }
    Ok(())
}

impl<'a> RecurringTaskRepository for SqliteRecurringTaskRepository<'a> {
    async fn create(&self, task: &RecurringTask) -> DbResult<RecurringTask> {
        validate(task)?;

        let id = if task.id.is_empty() {
            generate_entity_id()
        } else {
            task.id.clone()
        };
        let now = current_timestamp();
        // First occurrence is the start date unless the caller scheduled one.
        let next_due_date = task
            .next_due_date
            .clone()
            .or_else(|| Some(task.start_date.clone()));

        let mut tx = self.pool.begin().await?;
        let task_id = next_human_id(&mut *tx, "recurring_tasks", "task_id", "RTASK-", 4).await?;

        sqlx::query(
            r#"
            INSERT INTO recurring_tasks (id, task_id, title, description, frequency, priority, assigned_to, start_date, end_date, next_due_date, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&task_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.frequency.as_str())
        .bind(task.priority.as_str())
        .bind(&task.assigned_to)
        .bind(&task.start_date)
        .bind(&task.end_date)
        .bind(&next_due_date)
        .bind(task.is_active)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RecurringTask {
            id,
            task_id,
            next_due_date,
            created_at: now.clone(),
            updated_at: now,
            ..task.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<RecurringTask> {
        let sql = format!(
            "SELECT {} FROM recurring_tasks WHERE id = ? OR task_id = ?",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| row_to_recurring_task(&r))
            .ok_or_else(|| DbError::not_found("RecurringTask", id))
    }

    async fn list(&self, query: &RecurringTaskQuery) -> DbResult<ListResult<RecurringTask>> {
        let mut filter = Filter::new();
        filter
            .eq("frequency", query.frequency.map(|f| f.as_str()))
            .eq("is_active", query.is_active);

        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM recurring_tasks {} ORDER BY created_at DESC, rowid DESC{}",
            COLUMNS,
            where_clause,
            build_limit_offset_clause(&query.page)
        );
        let count_sql = format!("SELECT COUNT(*) FROM recurring_tasks {}", where_clause);

        let rows = filter.bind_query(sqlx::query(&sql)).fetch_all(self.pool).await?;
        let total: i64 = filter
            .bind_scalar(sqlx::query_scalar(&count_sql))
            .fetch_one(self.pool)
            .await?;

        Ok(ListResult {
            items: rows.iter().map(row_to_recurring_task).collect(),
            total: total as usize,
            limit: query.page.effective_limit(),
            offset: query.page.offset.unwrap_or(0),
        })
    }

    async fn update(&self, task: &RecurringTask) -> DbResult<RecurringTask> {
        validate(task)?;

        let result = sqlx::query(
            r#"
            UPDATE recurring_tasks
            SET title = ?, description = ?, frequency = ?, priority = ?, assigned_to = ?,
                start_date = ?, end_date = ?, next_due_date = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.frequency.as_str())
        .bind(task.priority.as_str())
        .bind(&task.assigned_to)
        .bind(&task.start_date)
        .bind(&task.end_date)
        .bind(&task.next_due_date)
        .bind(task.is_active)
        .bind(current_timestamp())
        .bind(&task.id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RecurringTask", &task.id));
        }

        self.get(&task.id).await
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM recurring_tasks WHERE id = ? OR task_id = ?")
            .bind(id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RecurringTask", id));
        }

        Ok(())
    }
}

fn row_to_recurring_task(row: &sqlx::sqlite::SqliteRow) -> RecurringTask {
    RecurringTask {
        id: row.get("id"),
        task_id: row.get("task_id"),
        title: row.get("title"),
        description: row.get("description"),
        frequency: Frequency::from_str(row.get("frequency")).unwrap_or_default(),
        priority: Priority::from_str(row.get("priority")).unwrap_or_default(),
        assigned_to: row.get("assigned_to"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        next_due_date: row.get("next_due_date"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
