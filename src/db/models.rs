//! Domain models for the CRM database.
//!
//! These models are storage-agnostic and represent the core entities
//! used throughout the application.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declare a lowercase string-backed enum with `Display`, `FromStr` and `as_str`.
///
/// The wire/database representation is the given literal for each variant.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($label:literal) {
            $first:ident => $first_str:literal,
            $($variant:ident => $str:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        pub enum $name {
            #[default]
            #[serde(rename = $first_str)]
            $first,
            $(
                #[serde(rename = $str)]
                $variant,
            )*
        }

        impl $name {
            /// All accepted values, in declaration order.
            pub const ALL: &'static [&'static str] = &[$first_str, $($str),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$first => $first_str,
                    $($name::$variant => $str,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $first_str => Ok($name::$first),
                    $($str => Ok($name::$variant),)*
                    _ => Err(format!(
                        "Invalid {}: '{}' (expected one of: {})",
                        $label,
                        s,
                        Self::ALL.join(", ")
                    )),
                }
            }
        }
    };
}

// =============================================================================
// Query Types for Pagination and Filtering
// =============================================================================

/// Default page size for list queries.
pub const DEFAULT_LIMIT: usize = 50;

/// Hard cap on page size for list queries.
pub const MAX_LIMIT: usize = 100;

/// Base pagination options - composed into entity-specific queries.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Maximum number of items to return.
    pub limit: Option<usize>,
    /// Number of items to skip.
    pub offset: Option<usize>,
}

impl Page {
    pub fn limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            offset: None,
        }
    }

    /// Effective limit: defaulted and capped.
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Query for Tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub page: Page,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<String>,
    /// Inclusive lower bound on `due_date`.
    pub due_from: Option<String>,
    /// Inclusive upper bound on `due_date`.
    pub due_to: Option<String>,
    /// Substring match on title or description.
    pub search: Option<String>,
}

/// Query for RecurringTasks.
#[derive(Debug, Clone, Default)]
pub struct RecurringTaskQuery {
    pub page: Page,
    pub frequency: Option<Frequency>,
    pub is_active: Option<bool>,
}

/// Query for Expenses.
#[derive(Debug, Clone, Default)]
pub struct ExpenseQuery {
    pub page: Page,
    pub status: Option<ExpenseStatus>,
    pub category: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

/// Query for Appointments.
#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
    pub page: Page,
    pub status: Option<AppointmentStatus>,
    pub contact_id: Option<String>,
    pub assigned_to: Option<String>,
    /// Inclusive lower bound on `start_time`.
    pub date_from: Option<String>,
    /// Inclusive upper bound on `start_time`.
    pub date_to: Option<String>,
}

/// Query for Leads.
#[derive(Debug, Clone, Default)]
pub struct LeadQuery {
    pub page: Page,
    pub status: Option<LeadStatus>,
    pub source: Option<String>,
    pub assigned_to: Option<String>,
}

/// Query for Contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
    pub page: Page,
    /// Substring match on name, email, phone or company.
    pub search: Option<String>,
    pub company: Option<String>,
}

/// Query for the agent audit log.
#[derive(Debug, Clone, Default)]
pub struct AgentLogQuery {
    pub page: Page,
    pub agent_id: Option<String>,
    pub module: Option<String>,
    pub result: Option<LogResult>,
}

/// Result of a paginated list query.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total count of all matching items (before pagination).
    pub total: usize,
    /// Limit that was applied.
    pub limit: usize,
    /// Offset that was applied.
    pub offset: usize,
}

/// 8-character hex ID type used for all entities.
pub type Id = String;

// =============================================================================
// Enums
// =============================================================================

string_enum! {
    /// Status of a one-off task.
    pub enum TaskStatus ("task status") {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    /// Priority shared by tasks and recurring tasks.
    pub enum Priority ("priority") {
        Medium => "medium",
        Low => "low",
        High => "high",
        Urgent => "urgent",
    }
}

string_enum! {
    /// How often a recurring task repeats.
    pub enum Frequency ("frequency") {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

string_enum! {
    pub enum ExpenseStatus ("expense status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Paid => "paid",
    }
}

string_enum! {
    pub enum AppointmentStatus ("appointment status") {
        Scheduled => "scheduled",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
}

string_enum! {
    pub enum LeadStatus ("lead status") {
        New => "new",
        Contacted => "contacted",
        Qualified => "qualified",
        Proposal => "proposal",
        Won => "won",
        Lost => "lost",
    }
}

string_enum! {
    pub enum InvoiceStatus ("invoice status") {
        Unpaid => "unpaid",
        PartiallyPaid => "partially_paid",
        Paid => "paid",
    }
}

string_enum! {
    /// Outcome recorded in the agent audit log.
    pub enum LogResult ("log result") {
        Success => "Success",
        Denied => "Denied",
        Error => "Error",
    }
}

string_enum! {
    pub enum PaymentGateway ("payment gateway") {
        Razorpay => "razorpay",
        Cashfree => "cashfree",
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A CRM staff user. Owns OTP logins and is the assignee of work items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Id,
    pub name: String,
    pub email: Option<String>,
    pub mobile: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Id,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A one-off piece of work. `task_id` is the human-readable `TASK-0001` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assigned_to: Option<Id>,
    pub contact_id: Option<Id>,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// A task template that repeats on a schedule. Human ID form: `RTASK-0001`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTask {
    pub id: Id,
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub priority: Priority,
    pub assigned_to: Option<Id>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub next_due_date: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A business expense. Human ID form: `EXP001`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Id,
    pub expense_id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub category: Option<String>,
    pub status: ExpenseStatus,
    pub expense_date: String,
    pub payment_method: Option<String>,
    pub submitted_by: Option<Id>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub contact_id: Option<Id>,
    pub assigned_to: Option<Id>,
    pub start_time: String,
    pub end_time: String,
    pub location: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Id,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: LeadStatus,
    pub estimated_value: Option<f64>,
    pub notes: Option<String>,
    pub assigned_to: Option<Id>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Id,
    pub invoice_number: String,
    pub contact_id: Option<Id>,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub balance_due: f64,
    pub status: InvoiceStatus,
    pub payment_link_id: Option<String>,
    pub payment_link_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: Id,
    pub invoice_id: Id,
    pub gateway: PaymentGateway,
    pub gateway_payment_id: String,
    pub amount: f64,
    pub method: Option<String>,
    pub status: String,
    pub created_at: String,
}

/// Human ID form: `RCPT-0001`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Id,
    pub receipt_number: String,
    pub invoice_id: Id,
    pub transaction_id: Id,
    pub amount: f64,
    pub created_at: String,
}

/// A payment reported by a gateway, ready to be applied to an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub invoice_id: Id,
    pub gateway: PaymentGateway,
    pub gateway_payment_id: String,
    pub amount: f64,
    pub method: Option<String>,
}

/// Result of applying a [`PaymentConfirmation`].
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Applied {
        transaction: PaymentTransaction,
        receipt: Receipt,
        invoice: Invoice,
    },
    /// The gateway payment id was already recorded; nothing changed.
    Duplicate { transaction_id: Id },
}

/// An AI caller of the MCP tool servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

/// Per-module grant for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ModulePermission {
    pub enabled: bool,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl ModulePermission {
    /// Whether this grant allows calling `tool`.
    pub fn allows(&self, tool: &str) -> bool {
        self.enabled && self.tools.iter().any(|t| t == tool)
    }
}

/// Module name (e.g. `tasks-server`) to grant.
pub type AgentPermissions = BTreeMap<String, ModulePermission>;

/// One row of the append-only agent audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLog {
    pub id: Id,
    pub agent_id: Id,
    pub agent_name: String,
    pub module: String,
    pub action: String,
    pub result: LogResult,
    pub user_context: Option<serde_json::Value>,
    pub details: Option<serde_json::Value>,
    pub created_at: String,
}

/// A one-time password issued for mobile login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpVerification {
    pub id: Id,
    pub mobile: String,
    pub otp: String,
    pub expires_at: String,
    pub verified: bool,
    pub attempts: i64,
    pub created_at: String,
}
