use miette::Diagnostic;

use crate::cli::error::CliError;

fn help_text(err: &CliError) -> Option<String> {
    err.help().map(|h| h.to_string())
}

#[test]
fn api_error_keeps_status_and_server_message() {
    let err = CliError::api(409, "Entity already exists: admin_users with id 'mobile'");
    assert_eq!(
        err.to_string(),
        "Request rejected (409): Entity already exists: admin_users with id 'mobile'"
    );
    assert_eq!(
        help_text(&err).as_deref(),
        Some("A record with that key already exists.")
    );
}

#[test]
fn not_found_points_at_agent_list() {
    let help = help_text(&CliError::api(404, "Agent not found: a1b2c3d4")).unwrap_or_default();
    assert!(help.contains("crmhub agent list"));
}

#[test]
fn server_failures_point_at_server_log() {
    let help = help_text(&CliError::api(503, "database unavailable")).unwrap_or_default();
    assert!(help.contains("log"));
}

#[test]
fn unexpected_status_has_no_hint() {
    assert!(help_text(&CliError::api(418, "teapot")).is_none());
}

#[test]
fn invalid_response_help_mentions_api_url() {
    let err = CliError::InvalidResponse {
        message: "expected value at line 1 column 1".to_string(),
    };
    assert!(help_text(&err).unwrap_or_default().contains("--api-url"));
}
