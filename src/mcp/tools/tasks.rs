//! MCP tools for one-off and recurring tasks (`tasks-server`).

use rmcp::{
    ErrorData as McpError,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars,
    schemars::JsonSchema,
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::db::{
    Database, Frequency, Page, Priority, RecurringTask, RecurringTaskQuery,
    RecurringTaskRepository, Task, TaskQuery, TaskRepository, TaskStatus,
};
use crate::mcp::tools::{
    Module, ModuleTools, RECENT_LIMIT, apply_limit, deleted_result, json_result, map_db_error,
    parse_opt, patch, to_json,
};

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetTasksParams {
    #[schemars(description = "Filter by status: pending, in_progress, completed, cancelled")]
    pub status: Option<String>,
    #[schemars(description = "Filter by priority: low, medium, high, urgent")]
    pub priority: Option<String>,
    #[schemars(description = "Filter by assignee (admin user ID)")]
    pub assigned_to: Option<String>,
    #[schemars(description = "Only tasks due on or after this date (YYYY-MM-DD)")]
    pub due_from: Option<String>,
    #[schemars(description = "Only tasks due on or before this date (YYYY-MM-DD)")]
    pub due_to: Option<String>,
    #[schemars(description = "Case-insensitive text search over title and description")]
    pub search: Option<String>,
    #[schemars(description = "Maximum number of tasks to return (default: 50, max: 100)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskParams {
    #[schemars(description = "Short title of the task")]
    pub title: String,
    pub description: Option<String>,
    #[schemars(description = "Status (default: pending)")]
    pub status: Option<String>,
    #[schemars(description = "Priority (default: medium)")]
    pub priority: Option<String>,
    #[schemars(description = "Admin user ID the task is assigned to")]
    pub assigned_to: Option<String>,
    #[schemars(description = "Contact ID the task relates to")]
    pub contact_id: Option<String>,
    #[schemars(description = "Due date (YYYY-MM-DD)")]
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTaskParams {
    #[schemars(description = "Task ID (internal id or TASK-0001 form)")]
    pub id: String,
    pub title: Option<String>,
    #[schemars(description = "New description. Empty string clears it.")]
    pub description: Option<String>,
    #[schemars(
        description = "New status. Moving to 'completed' stamps completed_at; moving away clears it."
    )]
    pub status: Option<String>,
    pub priority: Option<String>,
    #[schemars(description = "New assignee. Empty string unassigns.")]
    pub assigned_to: Option<String>,
    pub contact_id: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteTaskParams {
    #[schemars(description = "Task ID (internal id or TASK-0001 form)")]
    pub id: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetRecurringTasksParams {
    #[schemars(description = "Filter by frequency: daily, weekly, monthly, yearly")]
    pub frequency: Option<String>,
    #[schemars(description = "Filter by active flag")]
    pub is_active: Option<bool>,
    #[schemars(description = "Maximum number of rows to return (default: 50, max: 100)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateRecurringTaskParams {
    pub title: String,
    pub description: Option<String>,
    #[schemars(description = "daily, weekly, monthly or yearly")]
    pub frequency: String,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    #[schemars(description = "First occurrence (YYYY-MM-DD)")]
    pub start_date: String,
    #[schemars(description = "Last possible occurrence (YYYY-MM-DD)")]
    pub end_date: Option<String>,
    #[schemars(description = "Whether the schedule is running (default: true)")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateRecurringTaskParams {
    #[schemars(description = "Recurring task ID (internal id or RTASK-0001 form)")]
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub next_due_date: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteRecurringTaskParams {
    #[schemars(description = "Recurring task ID (internal id or RTASK-0001 form)")]
    pub id: String,
}

// =============================================================================
// Task Tools
// =============================================================================

pub struct TaskTools<D: Database> {
    db: Arc<D>,
    tool_router: ToolRouter<Self>,
}

impl<D: Database> Clone for TaskTools<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            tool_router: self.tool_router.clone(),
        }
    }
}

#[tool_router]
impl<D: Database + 'static> TaskTools<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "List tasks, newest first. Filter by status, priority, assignee, due date range or text."
    )]
    pub async fn get_tasks(
        &self,
        params: Parameters<GetTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let query = TaskQuery {
            page: apply_limit(params.limit),
            status: parse_opt(params.status.as_deref())?,
            priority: parse_opt(params.priority.as_deref())?,
            assigned_to: params.assigned_to,
            due_from: params.due_from,
            due_to: params.due_to,
            search: params.search,
        };

        let result = self.db.tasks().list(&query).await.map_err(map_db_error)?;
        json_result(&result)
    }

    #[tool(description = "Create a task. A TASK-0001 style ID is assigned automatically.")]
    pub async fn create_task(
        &self,
        params: Parameters<CreateTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let task = Task {
            id: String::new(),
            task_id: String::new(),
            title: params.title,
            description: params.description,
            status: parse_opt::<TaskStatus>(params.status.as_deref())?.unwrap_or_default(),
            priority: parse_opt::<Priority>(params.priority.as_deref())?.unwrap_or_default(),
            assigned_to: params.assigned_to,
            contact_id: params.contact_id,
            due_date: params.due_date,
            created_at: String::new(),
            updated_at: String::new(),
            completed_at: None,
        };

        let created = self.db.tasks().create(&task).await.map_err(map_db_error)?;
        json_result(&created)
    }

    #[tool(description = "Update a task. Only the given fields change.")]
    pub async fn update_task(
        &self,
        params: Parameters<UpdateTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut task = self.db.tasks().get(&params.id).await.map_err(map_db_error)?;

        if let Some(title) = params.title {
            task.title = title;
        }
        if let Some(status) = parse_opt(params.status.as_deref())? {
            task.status = status;
        }
        if let Some(priority) = parse_opt(params.priority.as_deref())? {
            task.priority = priority;
        }
        patch(&mut task.description, params.description);
        patch(&mut task.assigned_to, params.assigned_to);
        patch(&mut task.contact_id, params.contact_id);
        patch(&mut task.due_date, params.due_date);

        let updated = self.db.tasks().update(&task).await.map_err(map_db_error)?;
        json_result(&updated)
    }

    #[tool(description = "Delete a task permanently.")]
    pub async fn delete_task(
        &self,
        params: Parameters<DeleteTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        self.db
            .tasks()
            .delete(&params.0.id)
            .await
            .map_err(map_db_error)?;
        deleted_result("task", &params.0.id)
    }

    #[tool(description = "List recurring task schedules, newest first.")]
    pub async fn get_recurring_tasks(
        &self,
        params: Parameters<GetRecurringTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let query = RecurringTaskQuery {
            page: apply_limit(params.limit),
            frequency: parse_opt(params.frequency.as_deref())?,
            is_active: params.is_active,
        };

        let result = self
            .db
            .recurring_tasks()
            .list(&query)
            .await
            .map_err(map_db_error)?;
        json_result(&result)
    }

    #[tool(
        description = "Create a recurring task. next_due_date starts at start_date. An RTASK-0001 style ID is assigned automatically."
    )]
    pub async fn create_recurring_task(
        &self,
        params: Parameters<CreateRecurringTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let frequency = params
            .frequency
            .parse::<Frequency>()
            .map_err(|e| McpError::invalid_params(e, None))?;
        let task = RecurringTask {
            id: String::new(),
            task_id: String::new(),
            title: params.title,
            description: params.description,
            frequency,
            priority: parse_opt::<Priority>(params.priority.as_deref())?.unwrap_or_default(),
            assigned_to: params.assigned_to,
            start_date: params.start_date,
            end_date: params.end_date,
            next_due_date: None,
            is_active: params.is_active.unwrap_or(true),
            created_at: String::new(),
            updated_at: String::new(),
        };

        let created = self
            .db
            .recurring_tasks()
            .create(&task)
            .await
            .map_err(map_db_error)?;
        json_result(&created)
    }

    #[tool(description = "Update a recurring task. Only the given fields change.")]
    pub async fn update_recurring_task(
        &self,
        params: Parameters<UpdateRecurringTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut task = self
            .db
            .recurring_tasks()
            .get(&params.id)
            .await
            .map_err(map_db_error)?;

        if let Some(title) = params.title {
            task.title = title;
        }
        if let Some(frequency) = parse_opt(params.frequency.as_deref())? {
            task.frequency = frequency;
        }
        if let Some(priority) = parse_opt(params.priority.as_deref())? {
            task.priority = priority;
        }
        if let Some(start_date) = params.start_date {
            task.start_date = start_date;
        }
        if let Some(is_active) = params.is_active {
            task.is_active = is_active;
        }
        patch(&mut task.description, params.description);
        patch(&mut task.assigned_to, params.assigned_to);
        patch(&mut task.end_date, params.end_date);
        patch(&mut task.next_due_date, params.next_due_date);

        let updated = self
            .db
            .recurring_tasks()
            .update(&task)
            .await
            .map_err(map_db_error)?;
        json_result(&updated)
    }

    #[tool(description = "Delete a recurring task schedule permanently.")]
    pub async fn delete_recurring_task(
        &self,
        params: Parameters<DeleteRecurringTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        self.db
            .recurring_tasks()
            .delete(&params.0.id)
            .await
            .map_err(map_db_error)?;
        deleted_result("recurring_task", &params.0.id)
    }
}

impl<D: Database + 'static> ModuleTools<D> for TaskTools<D> {
    const MODULE: Module = Module::Tasks;

    fn new(db: Arc<D>) -> Self {
        TaskTools::new(db)
    }

    fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    async fn recent(&self, table: &str) -> Result<Option<Value>, McpError> {
        let page = Page::limit(Some(RECENT_LIMIT));
        match table {
            "tasks" => {
                let query = TaskQuery {
                    page,
                    ..Default::default()
                };
                let result = self.db.tasks().list(&query).await.map_err(map_db_error)?;
                Ok(Some(to_json(&result.items)?))
            }
            "recurring_tasks" => {
                let query = RecurringTaskQuery {
                    page,
                    ..Default::default()
                };
                let result = self
                    .db
                    .recurring_tasks()
                    .list(&query)
                    .await
                    .map_err(map_db_error)?;
                Ok(Some(to_json(&result.items)?))
            }
            _ => Ok(None),
        }
    }
}
