//! SQLite AgentLogRepository implementation.

use std::str::FromStr;

use sqlx::{Row, SqlitePool};

use super::helpers::{Filter, build_limit_offset_clause, parse_json_column};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{
    AgentLog, AgentLogQuery, AgentLogRepository, DbResult, ListResult, LogResult,
};

const COLUMNS: &str =
    "id, agent_id, agent_name, module, action, result, user_context, details, created_at";

pub struct SqliteAgentLogRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> AgentLogRepository for SqliteAgentLogRepository<'a> {
    async fn append(&self, log: &AgentLog) -> DbResult<AgentLog> {
        let id = if log.id.is_empty() {
            generate_entity_id()
        } else {
            log.id.clone()
        };
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO ai_agent_logs (id, agent_id, agent_name, module, action, result, user_context, details, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&log.agent_id)
        .bind(&log.agent_name)
        .bind(&log.module)
        .bind(&log.action)
        .bind(log.result.as_str())
        .bind(log.user_context.as_ref().map(|v| v.to_string()))
        .bind(log.details.as_ref().map(|v| v.to_string()))
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(AgentLog {
            id,
            created_at: now,
            ..log.clone()
        })
    }

    async fn list(&self, query: &AgentLogQuery) -> DbResult<ListResult<AgentLog>> {
        let mut filter = Filter::new();
        filter
            .eq("agent_id", query.agent_id.clone())
            .eq("module", query.module.clone())
            .eq("result", query.result.map(|r| r.as_str()));

        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM ai_agent_logs {} ORDER BY created_at DESC, rowid DESC{}",
            COLUMNS,
            where_clause,
            build_limit_offset_clause(&query.page)
        );
        let count_sql = format!("SELECT COUNT(*) FROM ai_agent_logs {}", where_clause);

        let rows = filter.bind_query(sqlx::query(&sql)).fetch_all(self.pool).await?;
        let total: i64 = filter
            .bind_scalar(sqlx::query_scalar(&count_sql))
            .fetch_one(self.pool)
            .await?;

        Ok(ListResult {
            items: rows.iter().map(row_to_log).collect(),
            total: total as usize,
            limit: query.page.effective_limit(),
            offset: query.page.offset.unwrap_or(0),
        })
    }
}

fn row_to_log(row: &sqlx::sqlite::SqliteRow) -> AgentLog {
    AgentLog {
        id: row.get("id"),
        agent_id: row.get("agent_id"),
        agent_name: row.get("agent_name"),
        module: row.get("module"),
        action: row.get("action"),
        result: LogResult::from_str(row.get("result")).unwrap_or(LogResult::Error),
        user_context: parse_json_column(row.get("user_context")),
        details: parse_json_column(row.get("details")),
        created_at: row.get("created_at"),
    }
}
