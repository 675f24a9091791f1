//! Database utility functions.

use chrono::{Duration, Utc};

/// Timestamp format used for every stored datetime.
///
/// Lexicographic order of formatted values matches chronological order,
/// so range filters and expiry checks can compare strings directly.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generate an 8-character hex ID for database entities
pub fn generate_entity_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// Get current datetime as string in SQLite format
pub fn current_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Current datetime shifted by `offset`, in SQLite format.
pub fn timestamp_after(offset: Duration) -> String {
    (Utc::now() + offset).format(TIMESTAMP_FORMAT).to_string()
}

/// Current date as `YYYY-MM-DD`.
pub fn current_date() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Format a human-readable sequential ID such as `TASK-0007` or `EXP012`.
pub fn format_human_id(prefix: &str, number: i64, width: usize) -> String {
    format!("{}{:0width$}", prefix, number, width = width)
}

/// Round a currency amount to two decimals.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
