//! SQLite ContactRepository implementation.

use sqlx::{Row, SqlitePool};

use super::helpers::{Filter, build_limit_offset_clause};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{Contact, ContactQuery, ContactRepository, DbError, DbResult, ListResult};

const COLUMNS: &str = "id, name, email, phone, company, address, notes, created_at, updated_at";

pub struct SqliteContactRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> ContactRepository for SqliteContactRepository<'a> {
    async fn create(&self, contact: &Contact) -> DbResult<Contact> {
        if contact.name.trim().is_empty() {
            return Err(DbError::validation("name cannot be empty"));
        }

        let id = if contact.id.is_empty() {
            generate_entity_id()
        } else {
            contact.id.clone()
        };
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO contacts (id, name, email, phone, company, address, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company)
        .bind(&contact.address)
        .bind(&contact.notes)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(Contact {
            id,
            created_at: now.clone(),
            updated_at: now,
            ..contact.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<Contact> {
        let sql = format!("SELECT {} FROM contacts WHERE id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| row_to_contact(&r))
            .ok_or_else(|| DbError::not_found("Contact", id))
    }

    async fn list(&self, query: &ContactQuery) -> DbResult<ListResult<Contact>> {
        let mut filter = Filter::new();
        filter
            .eq("company", query.company.clone())
            .contains_any(
                &["name", "email", "phone", "company"],
                query.search.as_deref(),
            );

        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM contacts {} ORDER BY name COLLATE NOCASE ASC, rowid ASC{}",
            COLUMNS,
            where_clause,
            build_limit_offset_clause(&query.page)
        );
        let count_sql = format!("SELECT COUNT(*) FROM contacts {}", where_clause);

        let rows = filter.bind_query(sqlx::query(&sql)).fetch_all(self.pool).await?;
        let total: i64 = filter
            .bind_scalar(sqlx::query_scalar(&count_sql))
            .fetch_one(self.pool)
            .await?;

        Ok(ListResult {
            items: rows.iter().map(row_to_contact).collect(),
            total: total as usize,
            limit: query.page.effective_limit(),
            offset: query.page.offset.unwrap_or(0),
        })
    }

    async fn update(&self, contact: &Contact) -> DbResult<Contact> {
        if contact.name.trim().is_empty() {
            return Err(DbError::validation("name cannot be empty"));
        }

        let result = sqlx::query(
            r#"
            UPDATE contacts
            SET name = ?, email = ?, phone = ?, company = ?, address = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company)
        .bind(&contact.address)
        .bind(&contact.notes)
        .bind(current_timestamp())
        .bind(&contact.id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contact", &contact.id));
        }

        self.get(&contact.id).await
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contact", id));
        }

        Ok(())
    }
}

fn row_to_contact(row: &sqlx::sqlite::SqliteRow) -> Contact {
    Contact {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        address: row.get("address"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
