//! Model Context Protocol (MCP) servers
//!
//! Each CRM module is served as its own MCP server over Streamable HTTP at
//! `/mcp/<module-name>`.
//!
//! - **guard**: authorizes the calling agent and writes the audit log
//! - **tools**: one tool set per module (tasks, expenses, appointments,
//!   leads, contacts)
//! - **server**: `ServerHandler` wiring tools, resources and prompts
//! - **service**: Streamable HTTP services and their routes

pub mod guard;
pub mod server;
mod service;
pub mod tools;

#[cfg(test)]
mod guard_test;
#[cfg(test)]
mod server_test;

pub use guard::PermissionGuard;
pub use server::McpServer;
pub use service::{create_mcp_service, mcp_routes};
pub use tools::Module;
