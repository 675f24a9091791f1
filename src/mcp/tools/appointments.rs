//! MCP tools for appointments (`appointments-server`).

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
    Appointment, AppointmentQuery, AppointmentRepository, AppointmentStatus, Database, Page,
};
use crate::mcp::tools::{
    Module, ModuleTools, RECENT_LIMIT, apply_limit, deleted_result, json_result, map_db_error,
    parse_opt, patch, to_json,
};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetAppointmentsParams {
    #[schemars(
        description = "Filter by status: scheduled, confirmed, completed, cancelled, no_show"
    )]
    pub status: Option<String>,
    pub contact_id: Option<String>,
    pub assigned_to: Option<String>,
    #[schemars(description = "Only appointments starting at or after this time")]
    pub date_from: Option<String>,
    #[schemars(description = "Only appointments starting at or before this time")]
    pub date_to: Option<String>,
    #[schemars(description = "Maximum number of appointments to return (default: 50, max: 100)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateAppointmentParams {
    pub title: String,
    pub description: Option<String>,
    pub contact_id: Option<String>,
    pub assigned_to: Option<String>,
    #[schemars(description = "Start time (YYYY-MM-DD HH:MM:SS)")]
    pub start_time: String,
    #[schemars(description = "End time (YYYY-MM-DD HH:MM:SS). Must be after start_time.")]
    pub end_time: String,
    pub location: Option<String>,
    #[schemars(description = "Status (default: scheduled)")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateAppointmentParams {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub contact_id: Option<String>,
    pub assigned_to: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteAppointmentParams {
    pub id: String,
}

pub struct AppointmentTools<D: Database> {
    db: Arc<D>,
    tool_router: ToolRouter<Self>,
}

impl<D: Database> Clone for AppointmentTools<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            tool_router: self.tool_router.clone(),
        }
    }
}

#[tool_router]
impl<D: Database + 'static> AppointmentTools<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "List appointments in start-time order. Filter by status, contact, assignee or time range."
    )]
    pub async fn get_appointments(
        &self,
        params: Parameters<GetAppointmentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let query = AppointmentQuery {
            page: apply_limit(params.limit),
            status: parse_opt(params.status.as_deref())?,
            contact_id: params.contact_id,
            assigned_to: params.assigned_to,
            date_from: params.date_from,
            date_to: params.date_to,
        };

        let result = self
            .db
            .appointments()
            .list(&query)
            .await
            .map_err(map_db_error)?;
        json_result(&result)
    }

    #[tool(description = "Schedule an appointment.")]
    pub async fn create_appointment(
        &self,
        params: Parameters<CreateAppointmentParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let appointment = Appointment {
            id: String::new(),
            title: params.title,
            description: params.description,
            contact_id: params.contact_id,
            assigned_to: params.assigned_to,
            start_time: params.start_time,
            end_time: params.end_time,
            location: params.location,
            status: parse_opt::<AppointmentStatus>(params.status.as_deref())?.unwrap_or_default(),
            created_at: String::new(),
            updated_at: String::new(),
        };

        let created = self
            .db
            .appointments()
            .create(&appointment)
            .await
            .map_err(map_db_error)?;
        json_result(&created)
    }

    #[tool(description = "Reschedule or update an appointment. Only the given fields change.")]
    pub async fn update_appointment(
        &self,
        params: Parameters<UpdateAppointmentParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut appointment = self
            .db
            .appointments()
            .get(&params.id)
            .await
            .map_err(map_db_error)?;

        if let Some(title) = params.title {
            appointment.title = title;
        }
        if let Some(start_time) = params.start_time {
            appointment.start_time = start_time;
        }
        if let Some(end_time) = params.end_time {
            appointment.end_time = end_time;
        }
        if let Some(status) = parse_opt(params.status.as_deref())? {
            appointment.status = status;
        }
        patch(&mut appointment.description, params.description);
        patch(&mut appointment.contact_id, params.contact_id);
        patch(&mut appointment.assigned_to, params.assigned_to);
        patch(&mut appointment.location, params.location);

        let updated = self
            .db
            .appointments()
            .update(&appointment)
            .await
            .map_err(map_db_error)?;
        json_result(&updated)
    }

    #[tool(description = "Delete an appointment permanently.")]
    pub async fn delete_appointment(
        &self,
        params: Parameters<DeleteAppointmentParams>,
    ) -> Result<CallToolResult, McpError> {
        self.db
            .appointments()
            .delete(&params.0.id)
            .await
            .map_err(map_db_error)?;
        deleted_result("appointment", &params.0.id)
    }
}

impl<D: Database + 'static> ModuleTools<D> for AppointmentTools<D> {
    const MODULE: Module = Module::Appointments;

    fn new(db: Arc<D>) -> Self {
        AppointmentTools::new(db)
    }

    fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    async fn recent(&self, table: &str) -> Result<Option<Value>, McpError> {
        if table != "appointments" {
            return Ok(None);
        }
        let query = AppointmentQuery {
            page: Page::limit(Some(RECENT_LIMIT)),
            ..Default::default()
        };
        let result = self
            .db
            .appointments()
            .list(&query)
            .await
            .map_err(map_db_error)?;
        Ok(Some(to_json(&result.items)?))
    }
}
