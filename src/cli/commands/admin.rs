//! `crmhub admin` commands: users allowed to log in with an OTP.

use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

use crate::cli::api_client::ApiClient;
use crate::cli::error::CliResult;
use crate::cli::utils::{apply_table_style, format_optional};

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub mobile: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CreateAdminUserRequest {
    pub name: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Tabled)]
pub(crate) struct AdminUserDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Mobile")]
    pub(crate) mobile: String,
    #[tabled(rename = "Email")]
    pub(crate) email: String,
    #[tabled(rename = "Role")]
    pub(crate) role: String,
}

impl From<&AdminUser> for AdminUserDisplay {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            mobile: user.mobile.clone(),
            email: format_optional(user.email.as_deref()),
            role: user.role.clone(),
        }
    }
}

pub async fn list_admins(api_client: &ApiClient, format: &str) -> CliResult<String> {
    let response = api_client.get("/api/v1/admin-users").send().await?;
    let users: Vec<AdminUser> = ApiClient::handle_response(response).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&users)?),
        _ => {
            if users.is_empty() {
                return Ok("No admin users found.".to_string());
            }
            let rows: Vec<AdminUserDisplay> = users.iter().map(|u| u.into()).collect();
            let mut table = Table::new(rows);
            apply_table_style(&mut table);
            Ok(table.to_string())
        }
    }
}

pub async fn create_admin(
    api_client: &ApiClient,
    request: CreateAdminUserRequest,
) -> CliResult<String> {
    let response = api_client
        .post("/api/v1/admin-users")
        .json(&request)
        .send()
        .await?;

    let user: AdminUser = ApiClient::handle_response(response).await?;
    Ok(format!(
        "✓ Created admin user: {} <{}> ({})",
        user.name, user.mobile, user.id
    ))
}
