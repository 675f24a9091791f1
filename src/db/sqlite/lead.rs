//! SQLite LeadRepository implementation.

use std::str::FromStr;

use sqlx::{Row, SqlitePool};

use super::helpers::{Filter, build_limit_offset_clause};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{DbError, DbResult, Lead, LeadQuery, LeadRepository, LeadStatus, ListResult};

const COLUMNS: &str = "id, name, email, phone, company, source, status, estimated_value, notes, assigned_to, created_at, updated_at";

pub struct SqliteLeadRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

fn validate(lead: &Lead) -> DbResult<()> {
    if lead.name.trim().is_empty() {
        return Err(DbError::validation("name cannot be empty"));
    }
    if let Some(value) = lead.estimated_value
        && value < 0.0
    {
        return Err(DbError::validation("estimated_value cannot be negative"));
    }
    Ok(())
}

impl<'a> LeadRepository for SqliteLeadRepository<'a> {
    async fn create(&self, lead: &Lead) -> DbResult<Lead> {
        validate(lead)?;

        let id = if lead.id.is_empty() {
            generate_entity_id()
        } else {
            lead.id.clone()
        };
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO leads (id, name, email, phone, company, source, status, estimated_value, notes, assigned_to, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.source)
        .bind(lead.status.as_str())
        .bind(lead.estimated_value)
        .bind(&lead.notes)
        .bind(&lead.assigned_to)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(Lead {
            id,
            created_at: now.clone(),
            updated_at: now,
            ..lead.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<Lead> {
        let sql = format!("SELECT {} FROM leads WHERE id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| row_to_lead(&r))
            .ok_or_else(|| DbError::not_found("Lead", id))
    }

    async fn list(&self, query: &LeadQuery) -> DbResult<ListResult<Lead>> {
        let mut filter = Filter::new();
        filter
            .eq("status", query.status.map(|s| s.as_str()))
            .eq("source", query.source.clone())
            .eq("assigned_to", query.assigned_to.clone());

        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM leads {} ORDER BY created_at DESC, rowid DESC{}",
            COLUMNS,
            where_clause,
            build_limit_offset_clause(&query.page)
        );
        let count_sql = format!("SELECT COUNT(*) FROM leads {}", where_clause);

        let rows = filter.bind_query(sqlx::query(&sql)).fetch_all(self.pool).await?;
        let total: i64 = filter
            .bind_scalar(sqlx::query_scalar(&count_sql))
            .fetch_one(self.pool)
            .await?;

        Ok(ListResult {
            items: rows.iter().map(row_to_lead).collect(),
            total: total as usize,
            limit: query.page.effective_limit(),
            offset: query.page.offset.unwrap_or(0),
        })
    }

    async fn update(&self, lead: &Lead) -> DbResult<Lead> {
        validate(lead)?;

        let result = sqlx::query(
            r#"
            UPDATE leads
            SET name = ?, email = ?, phone = ?, company = ?, source = ?, status = ?,
                estimated_value = ?, notes = ?, assigned_to = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.source)
        .bind(lead.status.as_str())
        .bind(lead.estimated_value)
        .bind(&lead.notes)
        .bind(&lead.assigned_to)
        .bind(current_timestamp())
        .bind(&lead.id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Lead", &lead.id));
        }

        self.get(&lead.id).await
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM leads WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Lead", id));
        }

        Ok(())
    }
}

fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Lead {
    Lead {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        source: row.get("source"),
        status: LeadStatus::from_str(row.get("status")).unwrap_or_default(),
        estimated_value: row.get("estimated_value"),
        notes: row.get("notes"),
        assigned_to: row.get("assigned_to"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
