//! Errors reported by the `crmhub` admin CLI.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("Cannot reach crmhub-api")]
    #[diagnostic(
        code(crmhub::cli::connection_failed),
        help(
            "Start it with `crmhub-api --db crmhub.db` (port 3000 unless CRMHUB_PORT says otherwise).\nIf it runs on another host, pass --api-url or export CRMHUB_API_URL."
        )
    )]
    ConnectionFailed {
        #[source]
        source: reqwest::Error,
    },

    #[error("Unreadable reply from crmhub-api: {message}")]
    #[diagnostic(
        code(crmhub::cli::invalid_response),
        help(
            "Check that --api-url points at crmhub-api and not another service, and that the CLI and server come from the same release."
        )
    )]
    InvalidResponse { message: String },

    #[error("Request rejected ({status}): {message}")]
    #[diagnostic(code(crmhub::cli::api_error))]
    ApiError {
        status: u16,
        message: String,
        #[help]
        hint: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(crmhub::cli::invalid_input))]
    InvalidInput { message: String },
}

impl CliError {
    /// Build an [`ApiError`](CliError::ApiError) with advice matching the status.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        let hint = match status {
            400 => Some("Check the ids and module names passed on the command line."),
            404 => Some("No record has that id. `crmhub agent list` shows the known agents."),
            409 => Some("A record with that key already exists."),
            500..=599 => Some("The server failed while handling the request; its log has the cause."),
            _ => None,
        };
        CliError::ApiError {
            status,
            message: message.into(),
            hint: hint.map(str::to_string),
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            CliError::ConnectionFailed { source: e }
        } else {
            CliError::InvalidResponse {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::InvalidResponse {
            message: e.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
