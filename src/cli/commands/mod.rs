pub mod admin;
pub mod agent;
pub mod logs;

#[cfg(test)]
#[path = "agent_test.rs"]
mod agent_test;
