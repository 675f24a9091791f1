//! SQLite implementation of the database traits.
//!
//! This module provides a SQLite-backed implementation of the repository
//! traits defined in the parent module.

mod admin_user;
mod agent;
mod agent_log;
mod appointment;
mod connection;
mod contact;
mod expense;
mod helpers;
mod invoice;
mod lead;
mod otp;
mod recurring_task;
mod task;

#[cfg(test)]
mod agent_test;
#[cfg(test)]
mod task_test;

pub use admin_user::SqliteAdminUserRepository;
pub use agent::SqliteAgentRepository;
pub use agent_log::SqliteAgentLogRepository;
pub use appointment::SqliteAppointmentRepository;
pub use connection::SqliteDatabase;
pub use contact::SqliteContactRepository;
pub use expense::SqliteExpenseRepository;
pub use invoice::SqliteInvoiceRepository;
pub use lead::SqliteLeadRepository;
pub use otp::SqliteOtpRepository;
pub use recurring_task::SqliteRecurringTaskRepository;
pub use task::SqliteTaskRepository;
