//! Shared helper functions for SQLite repositories.

use sqlx::query::{Query, QueryScalar};
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqliteConnection};

use crate::db::{DbResult, Page, utils::format_human_id};

/// A value bound to a `?` placeholder in a dynamically built filter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BindValue {
    Text(String),
    Real(f64),
    Int(i64),
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Real(v)
    }
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self {
        BindValue::Int(v as i64)
    }
}

/// Collects `WHERE` conditions and their bind values for list queries.
#[derive(Debug, Default)]
pub(crate) struct Filter {
    conditions: Vec<String>,
    binds: Vec<BindValue>,
}

impl Filter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `column = ?` when a value is given.
    pub(crate) fn eq<V: Into<BindValue>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        self.compare(column, "=", value)
    }

    /// `column <op> ?` when a value is given.
    pub(crate) fn compare<V: Into<BindValue>>(
        &mut self,
        column: &str,
        op: &str,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.conditions.push(format!("{} {} ?", column, op));
            self.binds.push(value.into());
        }
        self
    }

    /// Case-insensitive substring match over any of `columns`.
    pub(crate) fn contains_any(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        let pattern = format!("%{}%", escape_like(term));
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
            .collect();
        self.conditions.push(format!("({})", clauses.join(" OR ")));
        for _ in columns {
            self.binds.push(BindValue::Text(pattern.clone()));
        }
        self
    }

    pub(crate) fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub(crate) fn bind_query<'q>(
        &self,
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        for value in &self.binds {
            query = match value.clone() {
                BindValue::Text(v) => query.bind(v),
                BindValue::Real(v) => query.bind(v),
                BindValue::Int(v) => query.bind(v),
            };
        }
        query
    }

    pub(crate) fn bind_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
        for value in &self.binds {
            query = match value.clone() {
                BindValue::Text(v) => query.bind(v),
                BindValue::Real(v) => query.bind(v),
                BindValue::Int(v) => query.bind(v),
            };
        }
        query
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build LIMIT/OFFSET clause from Page parameters.
pub(crate) fn build_limit_offset_clause(page: &Page) -> String {
    format!(
        " LIMIT {} OFFSET {}",
        page.effective_limit(),
        page.offset.unwrap_or(0)
    )
}

/// Allocate the next human-readable ID for `column` in `table`.
///
/// The numeric suffix is `max(existing) + 1`, so IDs stay sequential even
/// after deletes in the middle. `table` and `column` are trusted constants.
pub(crate) async fn next_human_id(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    prefix: &str,
    width: usize,
) -> DbResult<String> {
    let sql = format!(
        "SELECT COALESCE(MAX(CAST(SUBSTR({col}, {start}) AS INTEGER)), 0) FROM {table} WHERE {col} LIKE ?",
        col = column,
        start = prefix.len() + 1,
        table = table,
    );
    let max: i64 = sqlx::query_scalar(&sql)
        .bind(format!("{}%", prefix))
        .fetch_one(&mut *conn)
        .await?;
    Ok(format_human_id(prefix, max + 1, width))
}

/// Parse an optional JSON column, tolerating malformed content.
pub(crate) fn parse_json_column(raw: Option<String>) -> Option<serde_json::Value> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}
