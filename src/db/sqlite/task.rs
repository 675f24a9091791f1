//! SQLite TaskRepository implementation.

use std::str::FromStr;

use sqlx::{Row, SqlitePool};

use super::helpers::{Filter, build_limit_offset_clause, next_human_id};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{
    DbError, DbResult, ListResult, Priority, Task, TaskQuery, TaskRepository, TaskStatus,
};

const COLUMNS: &str = "id, task_id, title, description, status, priority, assigned_to, contact_id, due_date, created_at, updated_at, completed_at";

/// SQLx-backed task repository.
pub struct SqliteTaskRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> TaskRepository for SqliteTaskRepository<'a> {
    async fn create(&self, task: &Task) -> DbResult<Task> {
        if task.title.trim().is_empty() {
            return Err(DbError::validation("title cannot be empty"));
        }

        let id = if task.id.is_empty() {
            generate_entity_id()
        } else {
            task.id.clone()
        };
        let now = current_timestamp();
        let completed_at = (task.status == TaskStatus::Completed).then(|| now.clone());

        let mut tx = self.pool.begin().await?;
        let task_id = next_human_id(&mut *tx, "tasks", "task_id", "TASK-", 4).await?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, task_id, title, description, status, priority, assigned_to, contact_id, due_date, created_at, updated_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&task_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(&task.assigned_to)
        .bind(&task.contact_id)
        .bind(&task.due_date)
        .bind(&now)
        .bind(&now)
        .bind(&completed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Task {
            id,
            task_id,
            created_at: now.clone(),
            updated_at: now,
            completed_at,
            ..task.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<Task> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ? OR task_id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| row_to_task(&r))
            .ok_or_else(|| DbError::not_found("Task", id))
    }

    async fn list(&self, query: &TaskQuery) -> DbResult<ListResult<Task>> {
        let mut filter = Filter::new();
        filter
            .eq("status", query.status.map(|s| s.as_str()))
            .eq("priority", query.priority.map(|p| p.as_str()))
            .eq("assigned_to", query.assigned_to.clone())
            .compare("due_date", ">=", query.due_from.clone())
            .compare("due_date", "<=", query.due_to.clone())
            .contains_any(&["title", "description"], query.search.as_deref());

        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM tasks {} ORDER BY created_at DESC, rowid DESC{}",
            COLUMNS,
            where_clause,
            build_limit_offset_clause(&query.page)
        );
        let count_sql = format!("SELECT COUNT(*) FROM tasks {}", where_clause);

        let rows = filter.bind_query(sqlx::query(&sql)).fetch_all(self.pool).await?;
        let total: i64 = filter
            .bind_scalar(sqlx::query_scalar(&count_sql))
            .fetch_one(self.pool)
            .await?;

        Ok(ListResult {
            items: rows.iter().map(row_to_task).collect(),
            total: total as usize,
            limit: query.page.effective_limit(),
            offset: query.page.offset.unwrap_or(0),
        })
    }

    async fn update(&self, task: &Task) -> DbResult<Task> {
        if task.title.trim().is_empty() {
            return Err(DbError::validation("title cannot be empty"));
        }
        let now = current_timestamp();

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, status = ?, priority = ?, assigned_to = ?,
                contact_id = ?, due_date = ?, updated_at = ?,
                completed_at = CASE WHEN ? = 'completed' THEN COALESCE(completed_at, ?) ELSE NULL END
            WHERE id = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(&task.assigned_to)
        .bind(&task.contact_id)
        .bind(&task.due_date)
        .bind(&now)
        .bind(task.status.as_str())
        .bind(&now)
        .bind(&task.id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Task", &task.id));
        }

        self.get(&task.id).await
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? OR task_id = ?")
            .bind(id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Task", id));
        }

        Ok(())
    }
}

/// Convert a database row to a Task model.
fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Task {
    Task {
        id: row.get("id"),
        task_id: row.get("task_id"),
        title: row.get("title"),
        description: row.get("description"),
        status: TaskStatus::from_str(row.get("status")).unwrap_or_default(),
        priority: Priority::from_str(row.get("priority")).unwrap_or_default(),
        assigned_to: row.get("assigned_to"),
        contact_id: row.get("contact_id"),
        due_date: row.get("due_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        completed_at: row.get("completed_at"),
    }
}
