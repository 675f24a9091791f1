use crate::cli::utils::*;

#[test]
fn test_truncate_with_ellipsis_short_string() {
    assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
}

#[test]
fn test_truncate_with_ellipsis_exact_length() {
    assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
}

#[test]
fn test_truncate_with_ellipsis_long_string() {
    let result = truncate_with_ellipsis("hello world this is a long string", 10);
    assert_eq!(result, "hello w...");
}

#[test]
fn test_truncate_with_ellipsis_unicode() {
    assert_eq!(truncate_with_ellipsis("नमस्ते world", 20), "नमस्ते world");
    assert_eq!(truncate_with_ellipsis("hello 世界", 7), "hell...");
}

#[test]
fn test_format_optional() {
    assert_eq!(format_optional(None), "-");
    assert_eq!(format_optional(Some("  ")), "-");
    assert_eq!(format_optional(Some("ops@example.com")), "ops@example.com");
}

#[test]
fn test_format_tools() {
    assert_eq!(format_tools(&[]), "-");
    assert_eq!(
        format_tools(&["get_tasks".to_string(), "create_task".to_string()]),
        "get_tasks, create_task"
    );
}

#[test]
fn test_parse_list_trims_and_drops_empty() {
    assert_eq!(
        parse_list(" get_tasks, create_task,,"),
        vec!["get_tasks".to_string(), "create_task".to_string()]
    );
    assert!(parse_list("").is_empty());
}
