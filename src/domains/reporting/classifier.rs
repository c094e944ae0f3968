//! Heuristic classification of raw failures.
//!
//! Rules are evaluated top to bottom and the first match wins, so a message
//! mentioning both "blocked" and "timeout" is SECURITY. Anything unmatched is
//! SYSTEM. Classification never fails.

use super::category::ErrorCategory;

/// One ordered classification rule.
struct Rule {
    category: ErrorCategory,
    message_keywords: &'static [&'static str],
    name_keywords: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        category: ErrorCategory::Security,
        message_keywords: &["security", "blocked", "unauthorized", "forbidden", "boundary"],
        name_keywords: &[],
    },
    Rule {
        category: ErrorCategory::Network,
        message_keywords: &["network", "connection", "timeout", "econnrefused", "enotfound"],
        name_keywords: &["network"],
    },
    Rule {
        category: ErrorCategory::Configuration,
        message_keywords: &["configuration", "config", "setting", "invalid setting"],
        name_keywords: &[],
    },
    Rule {
        category: ErrorCategory::User,
        message_keywords: &[
            "invalid",
            "not found",
            "does not exist",
            "enoent",
            "permission denied",
            "eacces",
        ],
        name_keywords: &[],
    },
];

impl Rule {
    fn matches(&self, message: &str, name: &str) -> bool {
        self.message_keywords.iter().any(|k| message.contains(k))
            || self.name_keywords.iter().any(|k| name.contains(k))
    }
}

/// Assign a failure to exactly one category.
///
/// `message` and `name` are matched case-insensitively by substring.
pub fn classify(message: &str, name: Option<&str>) -> ErrorCategory {
    let message = message.to_lowercase();
    let name = name.map(str::to_lowercase).unwrap_or_default();

    RULES
        .iter()
        .find(|rule| rule.matches(&message, &name))
        .map(|rule| rule.category)
        .unwrap_or(ErrorCategory::System)
}
