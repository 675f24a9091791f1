//! SQLite AgentRepository implementation.
//!
//! Permissions live in `ai_agent_permissions`, one row per module, with the
//! allowed tool names stored as a JSON array.

use sqlx::{Row, SqlitePool};

use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{
    Agent, AgentPermissions, AgentRepository, DbError, DbResult, ModulePermission,
};

pub struct SqliteAgentRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

fn parse_tools(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

impl<'a> AgentRepository for SqliteAgentRepository<'a> {
    async fn create(&self, agent: &Agent) -> DbResult<Agent> {
        if agent.name.trim().is_empty() {
            return Err(DbError::validation("name cannot be empty"));
        }

        let id = if agent.id.is_empty() {
            generate_entity_id()
        } else {
            agent.id.clone()
        };
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO ai_agents (id, name, description, is_active, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(agent.is_active)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(Agent {
            id,
            created_at: now,
            ..agent.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<Agent> {
        let row = sqlx::query(
            "SELECT id, name, description, is_active, created_at FROM ai_agents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| row_to_agent(&r))
            .ok_or_else(|| DbError::not_found("Agent", id))
    }

    async fn list(&self) -> DbResult<Vec<Agent>> {
        let rows = sqlx::query(
            "SELECT id, name, description, is_active, created_at FROM ai_agents ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.iter().map(row_to_agent).collect())
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM ai_agents WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Agent", id));
        }

        Ok(())
    }

    async fn permissions(&self, agent_id: &str) -> DbResult<AgentPermissions> {
        // Distinguish "no grants" from "no such agent".
        self.get(agent_id).await?;

        let rows = sqlx::query(
            "SELECT module, enabled, tools FROM ai_agent_permissions WHERE agent_id = ? ORDER BY module",
        )
        .bind(agent_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let tools: String = row.get("tools");
                (
                    row.get("module"),
                    ModulePermission {
                        enabled: row.get("enabled"),
                        tools: parse_tools(&tools),
                    },
                )
            })
            .collect())
    }

    async fn module_permission(
        &self,
        agent_id: &str,
        module: &str,
    ) -> DbResult<Option<ModulePermission>> {
        let row = sqlx::query(
            "SELECT enabled, tools FROM ai_agent_permissions WHERE agent_id = ? AND module = ?",
        )
        .bind(agent_id)
        .bind(module)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|row| {
            let tools: String = row.get("tools");
            ModulePermission {
                enabled: row.get("enabled"),
                tools: parse_tools(&tools),
            }
        }))
    }

    async fn set_permissions(
        &self,
        agent_id: &str,
        permissions: &AgentPermissions,
    ) -> DbResult<AgentPermissions> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM ai_agents WHERE id = ?")
            .bind(agent_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Agent", agent_id));
        }

        sqlx::query("DELETE FROM ai_agent_permissions WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&mut *tx)
            .await?;

        for (module, grant) in permissions {
            let tools = serde_json::to_string(&grant.tools).map_err(|e| DbError::Database {
                message: format!("Failed to serialize tools: {}", e),
            })?;
            sqlx::query(
                "INSERT INTO ai_agent_permissions (agent_id, module, enabled, tools) VALUES (?, ?, ?, ?)",
            )
            .bind(agent_id)
            .bind(module)
            .bind(grant.enabled)
            .bind(&tools)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(permissions.clone())
    }
}

fn row_to_agent(row: &sqlx::sqlite::SqliteRow) -> Agent {
    Agent {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}
