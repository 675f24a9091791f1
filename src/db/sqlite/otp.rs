//! SQLite OtpRepository implementation.

use sqlx::{Row, SqlitePool};

use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{DbError, DbResult, OtpRepository, OtpVerification};

const COLUMNS: &str = "id, mobile, otp, expires_at, verified, attempts, created_at";

pub struct SqliteOtpRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> OtpRepository for SqliteOtpRepository<'a> {
    async fn create(&self, otp: &OtpVerification) -> DbResult<OtpVerification> {
        let id = if otp.id.is_empty() {
            generate_entity_id()
        } else {
            otp.id.clone()
        };
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO otp_verifications (id, mobile, otp, expires_at, verified, attempts, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&otp.mobile)
        .bind(&otp.otp)
        .bind(&otp.expires_at)
        .bind(otp.verified)
        .bind(otp.attempts)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(OtpVerification {
            id,
            created_at: now,
            ..otp.clone()
        })
    }

    async fn latest_pending(&self, mobile: &str) -> DbResult<Option<OtpVerification>> {
        let sql = format!(
            "SELECT {} FROM otp_verifications WHERE mobile = ? AND verified = 0 ORDER BY created_at DESC, rowid DESC LIMIT 1",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(mobile)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|r| row_to_otp(&r)))
    }

    async fn record_failed_attempt(&self, id: &str) -> DbResult<i64> {
        let attempts: Option<i64> = sqlx::query_scalar(
            "UPDATE otp_verifications SET attempts = attempts + 1 WHERE id = ? RETURNING attempts",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        attempts.ok_or_else(|| DbError::not_found("OtpVerification", id))
    }

    async fn mark_verified(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE otp_verifications SET verified = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("OtpVerification", id));
        }

        Ok(())
    }
}

fn row_to_otp(row: &sqlx::sqlite::SqliteRow) -> OtpVerification {
    OtpVerification {
        id: row.get("id"),
        mobile: row.get("mobile"),
        otp: row.get("otp"),
        expires_at: row.get("expires_at"),
        verified: row.get("verified"),
        attempts: row.get("attempts"),
        created_at: row.get("created_at"),
    }
}
