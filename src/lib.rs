pub mod api;
pub mod cli;
pub mod db;
pub mod mcp;
pub mod otp;
pub mod payments;
