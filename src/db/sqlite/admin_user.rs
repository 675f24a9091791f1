//! SQLite AdminUserRepository implementation.

use sqlx::{Row, SqlitePool};

use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{AdminUser, AdminUserRepository, DbError, DbResult};

const COLUMNS: &str = "id, name, email, mobile, role, created_at";

pub struct SqliteAdminUserRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> AdminUserRepository for SqliteAdminUserRepository<'a> {
    async fn create(&self, user: &AdminUser) -> DbResult<AdminUser> {
        if user.name.trim().is_empty() {
            return Err(DbError::validation("name cannot be empty"));
        }
        if user.mobile.trim().is_empty() {
            return Err(DbError::validation("mobile cannot be empty"));
        }

        if self.get_by_mobile(&user.mobile).await?.is_some() {
            return Err(DbError::AlreadyExists {
                entity_type: "AdminUser".to_string(),
                id: user.mobile.clone(),
            });
        }

        let id = if user.id.is_empty() {
            generate_entity_id()
        } else {
            user.id.clone()
        };
        let role = if user.role.is_empty() {
            "admin".to_string()
        } else {
            user.role.clone()
        };
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO admin_users (id, name, email, mobile, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.mobile)
        .bind(&role)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(AdminUser {
            id,
            role,
            created_at: now,
            ..user.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<AdminUser> {
        let sql = format!("SELECT {} FROM admin_users WHERE id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| row_to_admin_user(&r))
            .ok_or_else(|| DbError::not_found("AdminUser", id))
    }

    async fn get_by_mobile(&self, mobile: &str) -> DbResult<Option<AdminUser>> {
        let sql = format!("SELECT {} FROM admin_users WHERE mobile = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(mobile)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|r| row_to_admin_user(&r)))
    }

    async fn list(&self) -> DbResult<Vec<AdminUser>> {
        let sql = format!(
            "SELECT {} FROM admin_users ORDER BY name COLLATE NOCASE ASC",
            COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_admin_user).collect())
    }
}

fn row_to_admin_user(row: &sqlx::sqlite::SqliteRow) -> AdminUser {
    AdminUser {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        mobile: row.get("mobile"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    }
}
