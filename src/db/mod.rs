//! Database abstraction layer.
//!
//! Trait-based abstractions for data access, so storage backends can be
//! swapped without touching the MCP tools or HTTP handlers.
//!
//! # Architecture
//!
//! - `error`: Storage-agnostic error types
//! - `models`: Domain entities (tasks, expenses, agents, invoices, ...)
//! - `repository`: Trait definitions for data access
//! - `sqlite`: SQLite implementation backed by sqlx

mod error;
mod models;
mod repository;
mod sqlite;
pub mod utils;

#[cfg(test)]
mod error_test;

pub use error::{DbError, DbResult};
pub use models::*;
pub use repository::*;
pub use sqlite::SqliteDatabase;
