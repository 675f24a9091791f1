//! SQLite database connection and migration management.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use super::{
    SqliteAdminUserRepository, SqliteAgentLogRepository, SqliteAgentRepository,
    SqliteAppointmentRepository, SqliteContactRepository, SqliteExpenseRepository,
    SqliteInvoiceRepository, SqliteLeadRepository, SqliteOtpRepository,
    SqliteRecurringTaskRepository, SqliteTaskRepository,
};
use crate::db::{Database, DbError, DbResult};

/// SQLite database implementation.
///
/// Hands out lightweight repositories borrowing the shared pool, avoiding
/// dynamic dispatch.
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (or create) a database file at the given path.
    pub async fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (useful for testing).
    ///
    /// Every pooled connection to `:memory:` would get its own empty
    /// database, so the pool is pinned to a single connection that never
    /// expires.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Direct access to the pool, for tests and advanced operations.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Database for SqliteDatabase {
    type AdminUsers<'a> = SqliteAdminUserRepository<'a>;
    type Contacts<'a> = SqliteContactRepository<'a>;
    type Tasks<'a> = SqliteTaskRepository<'a>;
    type RecurringTasks<'a> = SqliteRecurringTaskRepository<'a>;
    type Expenses<'a> = SqliteExpenseRepository<'a>;
    type Appointments<'a> = SqliteAppointmentRepository<'a>;
    type Leads<'a> = SqliteLeadRepository<'a>;
    type Invoices<'a> = SqliteInvoiceRepository<'a>;
    type Agents<'a> = SqliteAgentRepository<'a>;
    type AgentLogs<'a> = SqliteAgentLogRepository<'a>;
    type Otps<'a> = SqliteOtpRepository<'a>;

    async fn migrate(&self) -> DbResult<()> {
        sqlx::migrate!("./data/sql/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| DbError::Migration {
                message: e.to_string(),
            })
    }

    fn admin_users(&self) -> Self::AdminUsers<'_> {
        SqliteAdminUserRepository { pool: &self.pool }
    }

    fn contacts(&self) -> Self::Contacts<'_> {
        SqliteContactRepository { pool: &self.pool }
    }

    fn tasks(&self) -> Self::Tasks<'_> {
        SqliteTaskRepository { pool: &self.pool }
    }

    fn recurring_tasks(&self) -> Self::RecurringTasks<'_> {
        SqliteRecurringTaskRepository { pool: &self.pool }
    }

    fn expenses(&self) -> Self::Expenses<'_> {
        SqliteExpenseRepository { pool: &self.pool }
    }

    fn appointments(&self) -> Self::Appointments<'_> {
        SqliteAppointmentRepository { pool: &self.pool }
    }

    fn leads(&self) -> Self::Leads<'_> {
        SqliteLeadRepository { pool: &self.pool }
    }

    fn invoices(&self) -> Self::Invoices<'_> {
        SqliteInvoiceRepository { pool: &self.pool }
    }

    fn agents(&self) -> Self::Agents<'_> {
        SqliteAgentRepository { pool: &self.pool }
    }

    fn agent_logs(&self) -> Self::AgentLogs<'_> {
        SqliteAgentLogRepository { pool: &self.pool }
    }

    fn otps(&self) -> Self::Otps<'_> {
        SqliteOtpRepository { pool: &self.pool }
    }
}
