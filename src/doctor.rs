//! Health checks for `igx doctor`.
//!
//! Runs against any [`ArchiveReader`], so a ZIP can be checked without
//! unpacking it first.

use crate::archive::{ArchiveReader, INBOX_PREFIX, paths};
use crate::error::{IgxError, Result};
use crate::model::Conversation;
use crate::parser::ArchiveParser;
use chrono::{DateTime, Datelike, Utc};
use glob::{MatchOptions, Pattern};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// High-level category for a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Messages,
    Connections,
    Activity,
}

/// Status for an individual health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

impl CheckStatus {
    /// Whether the check is healthy enough for continued operation.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Single health check result.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub category: CheckCategory,
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// An export file the doctor looks for.
struct FileRequirement {
    pattern: &'static str,
    required: bool,
    category: CheckCategory,
    description: &'static str,
}

/// Expected files in an Instagram export.
const ARCHIVE_FILES: &[FileRequirement] = &[
    FileRequirement {
        pattern: "your_instagram_activity/messages/inbox/*/message_*.json",
        required: true,
        category: CheckCategory::Messages,
        description: "Message fragments",
    },
    FileRequirement {
        pattern: paths::FOLLOWERS,
        required: true,
        category: CheckCategory::Connections,
        description: "Followers list",
    },
    FileRequirement {
        pattern: paths::FOLLOWING,
        required: true,
        category: CheckCategory::Connections,
        description: "Following list",
    },
    FileRequirement {
        pattern: paths::LIKES,
        required: false,
        category: CheckCategory::Activity,
        description: "Liked posts",
    },
    FileRequirement {
        pattern: "your_instagram_activity/comments/post_comments_*.json",
        required: false,
        category: CheckCategory::Activity,
        description: "Post comments",
    },
    FileRequirement {
        pattern: paths::STORY_LIKES,
        required: false,
        category: CheckCategory::Activity,
        description: "Story likes",
    },
    FileRequirement {
        pattern: paths::SAVED,
        required: false,
        category: CheckCategory::Activity,
        description: "Saved posts",
    },
    FileRequirement {
        pattern: paths::PROFILE_SEARCHES,
        required: false,
        category: CheckCategory::Activity,
        description: "Profile searches",
    },
    FileRequirement {
        pattern: paths::WORD_SEARCHES,
        required: false,
        category: CheckCategory::Activity,
        description: "Keyword searches",
    },
    FileRequirement {
        pattern: paths::POSTS_VIEWED,
        required: false,
        category: CheckCategory::Activity,
        description: "Posts viewed",
    },
];

/// Files whose JSON is validated when present.
const PARSED_FILES: &[(&str, &str, CheckCategory)] = &[
    (paths::FOLLOWERS, "Followers", CheckCategory::Connections),
    (paths::FOLLOWING, "Following", CheckCategory::Connections),
    (paths::LIKES, "Likes", CheckCategory::Activity),
    (paths::COMMENTS, "Comments", CheckCategory::Activity),
    (paths::STORY_LIKES, "Story likes", CheckCategory::Activity),
    (paths::SAVED, "Saved posts", CheckCategory::Activity),
    (paths::PROFILE_SEARCHES, "Profile searches", CheckCategory::Activity),
    (paths::WORD_SEARCHES, "Keyword searches", CheckCategory::Activity),
    (paths::POSTS_VIEWED, "Posts viewed", CheckCategory::Activity),
];

/// Instagram launched in October 2010.
const FIRST_PLAUSIBLE_YEAR: i32 = 2010;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Entries matching a glob pattern, listed from its literal prefix.
fn matching_entries(reader: &dyn ArchiveReader, pattern: &str) -> Result<Vec<String>> {
    let compiled = Pattern::new(pattern)
        .map_err(|e| IgxError::invalid_archive(format!("Invalid glob pattern: {e}")))?;
    let literal = pattern.split(['*', '?', '[']).next().unwrap_or_default();
    Ok(reader
        .list_entries(literal)?
        .into_iter()
        .filter(|entry| compiled.matches_with(entry, MATCH_OPTIONS))
        .collect())
}

/// Check that required export files are present.
///
/// Missing optional files are not reported.
///
/// # Errors
/// Returns error if the archive cannot be enumerated.
pub fn check_required_files(reader: &dyn ArchiveReader) -> Result<Vec<HealthCheck>> {
    let mut checks = Vec::new();

    for req in ARCHIVE_FILES {
        debug!("Checking for pattern: {}", req.pattern);
        let matches = matching_entries(reader, req.pattern)?;
        let exists = !matches.is_empty();

        let status = if exists {
            CheckStatus::Pass
        } else if req.required {
            CheckStatus::Error
        } else {
            continue;
        };

        checks.push(HealthCheck {
            category: req.category,
            name: format!("File: {} ({})", req.pattern, req.description),
            status,
            message: if exists {
                format!("Found {} file(s)", matches.len())
            } else {
                "Not found".into()
            },
            suggestion: if exists {
                None
            } else {
                Some("Request the export in JSON format and include messages and connections".into())
            },
        });
    }

    Ok(checks)
}

/// Number of records in a parsed export file.
///
/// Exports are either a bare array or an object wrapping one array.
fn record_count(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(fields) => fields
            .values()
            .find_map(Value::as_array)
            .map_or(0, Vec::len),
        _ => 0,
    }
}

/// Validate the JSON of every relationship and activity file present.
#[must_use]
pub fn check_json_structure(reader: &dyn ArchiveReader) -> Vec<HealthCheck> {
    let mut checks = Vec::new();

    for &(file, label, category) in PARSED_FILES {
        if !reader.contains(file) {
            continue;
        }
        debug!("Validating JSON structure: {}", file);

        let parsed = reader.read_to_string(file).and_then(|content| {
            serde_json::from_str::<Value>(&content)
                .map_err(|e| IgxError::parse_error(file, format!("Invalid JSON: {e}")))
        });

        match parsed {
            Ok(value) => checks.push(HealthCheck {
                category,
                name: format!("Parse: {label}"),
                status: CheckStatus::Pass,
                message: format!("{} items parsed", record_count(&value)),
                suggestion: None,
            }),
            Err(e) => {
                warn!("Parse error for {}: {}", file, e);
                checks.push(HealthCheck {
                    category,
                    name: format!("Parse: {label}"),
                    status: CheckStatus::Error,
                    message: format!("Parse error: {e}"),
                    suggestion: Some("Check if file is corrupted or incomplete".into()),
                });
            }
        }
    }

    checks
}

/// Check message timestamps for implausible values.
#[must_use]
pub fn check_timestamp_consistency(conversations: &BTreeMap<String, Conversation>) -> HealthCheck {
    let now = Utc::now();
    let mut issues: Vec<String> = Vec::new();
    let mut total = 0usize;

    for (id, conversation) in conversations {
        for message in &conversation.messages {
            total += 1;
            match DateTime::<Utc>::from_timestamp_millis(message.timestamp_ms) {
                Some(when) if when > now => issues.push(format!("{id}: future date")),
                Some(when) if when.year() < FIRST_PLAUSIBLE_YEAR => {
                    issues.push(format!("{id}: before {FIRST_PLAUSIBLE_YEAR}"));
                }
                Some(_) => {}
                None => issues.push(format!("{id}: out of range")),
            }
        }
    }

    HealthCheck {
        category: CheckCategory::Messages,
        name: "Timestamp Validity".into(),
        status: if issues.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Warning
        },
        message: if issues.is_empty() {
            format!("All {total} timestamps valid")
        } else {
            format!("{} timestamp issues found", issues.len())
        },
        suggestion: if issues.is_empty() {
            None
        } else {
            Some(format!(
                "Issues: {}{}",
                issues[..3.min(issues.len())].join("; "),
                if issues.len() > 3 { "..." } else { "" }
            ))
        },
    }
}

/// Check that each conversation has at least one message.
#[must_use]
pub fn check_empty_conversations(conversations: &BTreeMap<String, Conversation>) -> HealthCheck {
    let empty: Vec<&str> = conversations
        .iter()
        .filter(|(_, c)| c.messages.is_empty())
        .map(|(id, _)| id.as_str())
        .collect();

    HealthCheck {
        category: CheckCategory::Messages,
        name: "Conversations".into(),
        status: if empty.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Warning
        },
        message: if empty.is_empty() {
            format!("{} conversations parsed", conversations.len())
        } else {
            format!("{} of {} conversations have no messages", empty.len(), conversations.len())
        },
        suggestion: if empty.is_empty() {
            None
        } else {
            Some(format!(
                "Empty: {}{}",
                empty[..3.min(empty.len())].join(", "),
                if empty.len() > 3 { "..." } else { "" }
            ))
        },
    }
}

/// Run all archive validation checks.
///
/// # Errors
/// Returns error if the archive cannot be enumerated.
pub fn validate_archive(reader: &dyn ArchiveReader) -> Result<Vec<HealthCheck>> {
    let mut all_checks = Vec::new();

    all_checks.extend(check_required_files(reader)?);
    all_checks.extend(check_json_structure(reader));

    if !reader.list_entries(INBOX_PREFIX)?.is_empty() {
        let start = Instant::now();
        match ArchiveParser::new(reader).parse_conversations() {
            Ok(conversations) => {
                info!(
                    "Parsed {} conversations for validation checks in {}ms",
                    conversations.len(),
                    start.elapsed().as_millis()
                );
                all_checks.push(check_empty_conversations(&conversations));
                all_checks.push(check_timestamp_consistency(&conversations));
            }
            Err(e) => all_checks.push(HealthCheck {
                category: CheckCategory::Messages,
                name: "Conversations".into(),
                status: CheckStatus::Error,
                message: format!("Parse error: {e}"),
                suggestion: Some("Check if the inbox was exported completely".into()),
            }),
        }
    }

    Ok(all_checks)
}
