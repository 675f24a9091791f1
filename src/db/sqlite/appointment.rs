//! SQLite AppointmentRepository implementation.

use std::str::FromStr;

use sqlx::{Row, SqlitePool};

use super::helpers::{Filter, build_limit_offset_clause};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{
    Appointment, AppointmentQuery, AppointmentRepository, AppointmentStatus, DbError, DbResult,
    ListResult,
};

const COLUMNS: &str = "id, title, description, contact_id, assigned_to, start_time, end_time, location, status, created_at, updated_at";

pub struct SqliteAppointmentRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

fn validate(appointment: &Appointment) -> DbResult<()> {
    if appointment.title.trim().is_empty() {
        return Err(DbError::validation("title cannot be empty"));
    }
    if appointment.start_time.is_empty() || appointment.end_time.is_empty() {
        return Err(DbError::validation("start_time and end_time are required"));
    }
    if appointment.end_time <= appointment.start_time {
        return Err(DbError::validation("end_time must be after start_time"));
    }
    Ok(())
}

impl<'a> AppointmentRepository for SqliteAppointmentRepository<'a> {
    async fn create(&self, appointment: &Appointment) -> DbResult<Appointment> {
        validate(appointment)?;

        let id = if appointment.id.is_empty() {
            generate_entity_id()
        } else {
            appointment.id.clone()
        };
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO appointments (id, title, description, contact_id, assigned_to, start_time, end_time, location, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&appointment.title)
        .bind(&appointment.description)
        .bind(&appointment.contact_id)
        .bind(&appointment.assigned_to)
        .bind(&appointment.start_time)
        .bind(&appointment.end_time)
        .bind(&appointment.location)
        .bind(appointment.status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(Appointment {
            id,
            created_at: now.clone(),
            updated_at: now,
            ..appointment.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<Appointment> {
        let sql = format!("SELECT {} FROM appointments WHERE id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| row_to_appointment(&r))
            .ok_or_else(|| DbError::not_found("Appointment", id))
    }

    async fn list(&self, query: &AppointmentQuery) -> DbResult<ListResult<Appointment>> {
        let mut filter = Filter::new();
        filter
            .eq("status", query.status.map(|s| s.as_str()))
            .eq("contact_id", query.contact_id.clone())
            .eq("assigned_to", query.assigned_to.clone())
            .compare("start_time", ">=", query.date_from.clone())
            .compare("start_time", "<=", query.date_to.clone());

        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM appointments {} ORDER BY start_time ASC, rowid ASC{}",
            COLUMNS,
            where_clause,
            build_limit_offset_clause(&query.page)
        );
        let count_sql = format!("SELECT COUNT(*) FROM appointments {}", where_clause);

        let rows = filter.bind_query(sqlx::query(&sql)).fetch_all(self.pool).await?;
        let total: i64 = filter
            .bind_scalar(sqlx::query_scalar(&count_sql))
            .fetch_one(self.pool)
            .await?;

        Ok(ListResult {
            items: rows.iter().map(row_to_appointment).collect(),
            total: total as usize,
            limit: query.page.effective_limit(),
            offset: query.page.offset.unwrap_or(0),
        })
    }

    async fn update(&self, appointment: &Appointment) -> DbResult<Appointment> {
        validate(appointment)?;

        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET title = ?, description = ?, contact_id = ?, assigned_to = ?, start_time = ?,
                end_time = ?, location = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&appointment.title)
        .bind(&appointment.description)
        .bind(&appointment.contact_id)
        .bind(&appointment.assigned_to)
        .bind(&appointment.start_time)
        .bind(&appointment.end_time)
        .bind(&appointment.location)
        .bind(appointment.status.as_str())
        .bind(current_timestamp())
        .bind(&appointment.id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", &appointment.id));
        }

        self.get(&appointment.id).await
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", id));
        }

        Ok(())
    }
}

fn row_to_appointment(row: &sqlx::sqlite::SqliteRow) -> Appointment {
    Appointment {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        contact_id: row.get("contact_id"),
        assigned_to: row.get("assigned_to"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        location: row.get("location"),
        status: AppointmentStatus::from_str(row.get("status")).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
