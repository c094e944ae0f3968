//! User-facing message and recovery suggestion synthesis.

use super::category::ErrorCategory;
use super::classified::{ClassifiedError, ErrorContext};

/// Failures of individual files and directories.
const FILE_MESSAGES: &[(&str, &str)] = &[
    ("enoent", "The file or directory could not be found"),
    ("eacces", "Permission denied: you do not have access to this file or directory"),
    ("permission denied", "Permission denied: you do not have access to this file or directory"),
    ("eexist", "The file or directory already exists"),
    ("enotdir", "Expected a directory but found a file"),
    ("eisdir", "Expected a file but found a directory"),
    ("enotempty", "The directory is not empty"),
];

const SYSTEM_MESSAGES: &[(&str, &str)] = &[
    ("enospc", "Not enough disk space to complete the operation"),
    ("emfile", "Too many open files; close some files and try again"),
    ("enomem", "The system ran out of memory"),
    ("out of memory", "The system ran out of memory"),
];

const NETWORK_MESSAGES: &[(&str, &str)] = &[
    (
        "econnrefused",
        "Connection refused: could not connect to the file operations server. Make sure the server is running",
    ),
    ("econnreset", "The connection to the file operations server was reset"),
    ("etimedout", "The file operations server did not respond in time"),
    ("timeout", "The file operations server did not respond in time"),
    ("enotfound", "The file operations server address could not be resolved"),
];

fn lookup(message: &str, tables: &[&[(&'static str, &'static str)]]) -> Option<&'static str> {
    let lower = message.to_lowercase();
    tables
        .iter()
        .flat_map(|table| table.iter())
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, text)| *text)
}

fn generic_message(error: &ClassifiedError) -> String {
    format!("{}: {}", error.category.label(), error.message)
}

/// Human-readable message for an error.
pub fn user_message(error: &ClassifiedError) -> String {
    let known = match error.category {
        ErrorCategory::Security => return security_message(error),
        ErrorCategory::User => lookup(&error.message, &[FILE_MESSAGES]),
        ErrorCategory::System => lookup(&error.message, &[SYSTEM_MESSAGES, FILE_MESSAGES]),
        ErrorCategory::Network => lookup(&error.message, &[NETWORK_MESSAGES]),
        ErrorCategory::Configuration => None,
    };

    known
        .map(String::from)
        .unwrap_or_else(|| generic_message(error))
}

/// Explain a security denial, naming the path and what it ran into.
pub fn security_message(error: &ClassifiedError) -> String {
    let path = error.context_str("path");
    let boundary = error.context_str("boundary");
    let pattern = error.context_str("pattern");

    match (path, boundary, pattern) {
        (Some(path), Some(boundary), _) => format!(
            "Access denied: '{path}' is outside the allowed boundary '{boundary}'"
        ),
        (Some(path), None, Some(pattern)) => {
            format!("Access denied: '{path}' matches blocked pattern '{pattern}'")
        }
        (Some(path), None, None) => {
            format!("Access denied: '{path}' is blocked by the security policy")
        }
        (None, ..) => generic_message(error),
    }
}

/// Recovery suggestions for a category, specialized by context.
pub fn suggestions(category: ErrorCategory, context: Option<&ErrorContext>) -> Vec<String> {
    let fixed: &[&str] = match category {
        ErrorCategory::User => &[
            "Check that the path is spelled correctly",
            "Verify that the file or directory exists",
            "Check the file permissions",
        ],
        ErrorCategory::System => &[
            "Try the operation again",
            "Check available disk space and memory",
            "Check the logs for more details",
        ],
        ErrorCategory::Network => &[
            "Check that the file operations server is running",
            "Check your network connectivity",
            "Restart the file operations server",
        ],
        ErrorCategory::Security => &[
            "Review the security settings",
            "Check the blocked paths and blocked patterns",
        ],
        ErrorCategory::Configuration => &[
            "Open the settings and review the configuration",
            "Reset invalid settings to their defaults",
        ],
    };

    let mut out: Vec<String> = fixed.iter().map(|s| s.to_string()).collect();

    if category == ErrorCategory::Security {
        let path = context
            .and_then(|ctx| ctx.get("path"))
            .and_then(|value| value.as_str());
        if let Some(path) = path {
            out.push(format!(
                "The path '{path}' is not accessible under the current security policy"
            ));
        }
    }

    out
}
