//! Repository traits for data access abstraction.
//!
//! These traits define the contract for data access, allowing different
//! storage backends to be swapped without changing business logic.
//! Futures are declared `Send` so the traits can be used from axum handlers
//! and MCP tools that are generic over [`Database`].

use std::future::Future;

use crate::db::{
    DbResult,
    models::{
        AdminUser, Agent, AgentLog, AgentLogQuery, AgentPermissions, Appointment,
        AppointmentQuery, Contact, ContactQuery, Expense, ExpenseQuery, Invoice, Lead, LeadQuery,
        ListResult, ModulePermission, OtpVerification, PaymentConfirmation, PaymentOutcome,
        PaymentTransaction, Receipt, RecurringTask, RecurringTaskQuery, Task, TaskQuery,
    },
};

/// Repository for AdminUser operations.
pub trait AdminUserRepository {
    /// Create a new admin user. Mobile numbers are unique.
    fn create(&self, user: &AdminUser) -> impl Future<Output = DbResult<AdminUser>> + Send;

    /// Get an admin user by ID.
    fn get(&self, id: &str) -> impl Future<Output = DbResult<AdminUser>> + Send;

    /// Find the admin user owning a mobile number.
    fn get_by_mobile(
        &self,
        mobile: &str,
    ) -> impl Future<Output = DbResult<Option<AdminUser>>> + Send;

    /// Get all admin users ordered by name.
    fn list(&self) -> impl Future<Output = DbResult<Vec<AdminUser>>> + Send;
}

/// Repository for Contact operations.
pub trait ContactRepository {
    fn create(&self, contact: &Contact) -> impl Future<Output = DbResult<Contact>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = DbResult<Contact>> + Send;

    fn list(
        &self,
        query: &ContactQuery,
    ) -> impl Future<Output = DbResult<ListResult<Contact>>> + Send;

    /// Persist all mutable fields. Returns the stored row.
    fn update(&self, contact: &Contact) -> impl Future<Output = DbResult<Contact>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for Task operations.
///
/// Lookups accept either the internal `id` or the `TASK-0001` form.
pub trait TaskRepository {
    /// Create a new task, allocating its human-readable ID.
    fn create(&self, task: &Task) -> impl Future<Output = DbResult<Task>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = DbResult<Task>> + Send;

    fn list(&self, query: &TaskQuery) -> impl Future<Output = DbResult<ListResult<Task>>> + Send;

    /// Persist all mutable fields. Stamps `completed_at` when the status
    /// becomes `completed` and clears it otherwise.
    fn update(&self, task: &Task) -> impl Future<Output = DbResult<Task>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for RecurringTask operations.
pub trait RecurringTaskRepository {
    fn create(&self, task: &RecurringTask)
    -> impl Future<Output = DbResult<RecurringTask>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = DbResult<RecurringTask>> + Send;

    fn list(
        &self,
        query: &RecurringTaskQuery,
    ) -> impl Future<Output = DbResult<ListResult<RecurringTask>>> + Send;

    fn update(&self, task: &RecurringTask)
    -> impl Future<Output = DbResult<RecurringTask>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for Expense operations.
///
/// Lookups accept either the internal `id` or the `EXP001` form.
pub trait ExpenseRepository {
    /// Create a new expense. Rejects non-positive amounts.
    fn create(&self, expense: &Expense) -> impl Future<Output = DbResult<Expense>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = DbResult<Expense>> + Send;

    fn list(
        &self,
        query: &ExpenseQuery,
    ) -> impl Future<Output = DbResult<ListResult<Expense>>> + Send;

    fn update(&self, expense: &Expense) -> impl Future<Output = DbResult<Expense>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for Appointment operations.
pub trait AppointmentRepository {
    /// Create a new appointment. `end_time` must be after `start_time`.
    fn create(
        &self,
        appointment: &Appointment,
    ) -> impl Future<Output = DbResult<Appointment>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = DbResult<Appointment>> + Send;

    fn list(
        &self,
        query: &AppointmentQuery,
    ) -> impl Future<Output = DbResult<ListResult<Appointment>>> + Send;

    fn update(
        &self,
        appointment: &Appointment,
    ) -> impl Future<Output = DbResult<Appointment>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for Lead operations.
pub trait LeadRepository {
    fn create(&self, lead: &Lead) -> impl Future<Output = DbResult<Lead>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = DbResult<Lead>> + Send;

    fn list(&self, query: &LeadQuery) -> impl Future<Output = DbResult<ListResult<Lead>>> + Send;

    fn update(&self, lead: &Lead) -> impl Future<Output = DbResult<Lead>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for invoices and the payments applied to them.
pub trait InvoiceRepository {
    /// Create an invoice. `balance_due` starts at `total_amount - paid_amount`.
    fn create(&self, invoice: &Invoice) -> impl Future<Output = DbResult<Invoice>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = DbResult<Invoice>> + Send;

    fn get_by_number(
        &self,
        invoice_number: &str,
    ) -> impl Future<Output = DbResult<Option<Invoice>>> + Send;

    /// Remember the gateway payment link generated for an invoice.
    fn set_payment_link(
        &self,
        id: &str,
        link_id: &str,
        link_url: &str,
    ) -> impl Future<Output = DbResult<Invoice>> + Send;

    /// Insert the transaction and receipt and recompute the invoice balance,
    /// all in one database transaction. A gateway payment id seen before is
    /// reported as [`PaymentOutcome::Duplicate`] and changes nothing.
    fn apply_payment(
        &self,
        payment: &PaymentConfirmation,
    ) -> impl Future<Output = DbResult<PaymentOutcome>> + Send;

    fn list_transactions(
        &self,
        invoice_id: &str,
    ) -> impl Future<Output = DbResult<Vec<PaymentTransaction>>> + Send;

    fn list_receipts(
        &self,
        invoice_id: &str,
    ) -> impl Future<Output = DbResult<Vec<Receipt>>> + Send;
}

/// Repository for AI agents and their permission grants.
pub trait AgentRepository {
    fn create(&self, agent: &Agent) -> impl Future<Output = DbResult<Agent>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = DbResult<Agent>> + Send;

    fn list(&self) -> impl Future<Output = DbResult<Vec<Agent>>> + Send;

    /// Delete an agent and its permissions. Audit log rows are kept.
    fn delete(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// All module grants for an agent.
    fn permissions(&self, agent_id: &str) -> impl Future<Output = DbResult<AgentPermissions>> + Send;

    /// The grant for one module, if any.
    fn module_permission(
        &self,
        agent_id: &str,
        module: &str,
    ) -> impl Future<Output = DbResult<Option<ModulePermission>>> + Send;

    /// Replace every grant of an agent with `permissions`.
    fn set_permissions(
        &self,
        agent_id: &str,
        permissions: &AgentPermissions,
    ) -> impl Future<Output = DbResult<AgentPermissions>> + Send;
}

/// Append-only audit trail of agent tool calls.
pub trait AgentLogRepository {
    fn append(&self, log: &AgentLog) -> impl Future<Output = DbResult<AgentLog>> + Send;

    /// Newest first.
    fn list(
        &self,
        query: &AgentLogQuery,
    ) -> impl Future<Output = DbResult<ListResult<AgentLog>>> + Send;
}

/// Repository for one-time passwords.
pub trait OtpRepository {
    fn create(&self, otp: &OtpVerification)
    -> impl Future<Output = DbResult<OtpVerification>> + Send;

    /// Newest unverified code issued for a mobile number.
    fn latest_pending(
        &self,
        mobile: &str,
    ) -> impl Future<Output = DbResult<Option<OtpVerification>>> + Send;

    /// Increment the failed-attempt counter. Returns the new count.
    fn record_failed_attempt(&self, id: &str) -> impl Future<Output = DbResult<i64>> + Send;

    fn mark_verified(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Combined database interface.
///
/// Repositories are handed out through associated types, so callers generic
/// over `D: Database` get static dispatch.
pub trait Database: Send + Sync {
    type AdminUsers<'a>: AdminUserRepository + Send
    where
        Self: 'a;
    type Contacts<'a>: ContactRepository + Send
    where
        Self: 'a;
    type Tasks<'a>: TaskRepository + Send
    where
        Self: 'a;
    type RecurringTasks<'a>: RecurringTaskRepository + Send
    where
        Self: 'a;
    type Expenses<'a>: ExpenseRepository + Send
    where
        Self: 'a;
    type Appointments<'a>: AppointmentRepository + Send
    where
        Self: 'a;
    type Leads<'a>: LeadRepository + Send
    where
        Self: 'a;
    type Invoices<'a>: InvoiceRepository + Send
    where
        Self: 'a;
    type Agents<'a>: AgentRepository + Send
    where
        Self: 'a;
    type AgentLogs<'a>: AgentLogRepository + Send
    where
        Self: 'a;
    type Otps<'a>: OtpRepository + Send
    where
        Self: 'a;

    /// Run pending migrations.
    fn migrate(&self) -> impl Future<Output = DbResult<()>> + Send;

    fn admin_users(&self) -> Self::AdminUsers<'_>;

    fn contacts(&self) -> Self::Contacts<'_>;

    fn tasks(&self) -> Self::Tasks<'_>;

    fn recurring_tasks(&self) -> Self::RecurringTasks<'_>;

    fn expenses(&self) -> Self::Expenses<'_>;

    fn appointments(&self) -> Self::Appointments<'_>;

    fn leads(&self) -> Self::Leads<'_>;

    fn invoices(&self) -> Self::Invoices<'_>;

    fn agents(&self) -> Self::Agents<'_>;

    fn agent_logs(&self) -> Self::AgentLogs<'_>;

    fn otps(&self) -> Self::Otps<'_>;
}
