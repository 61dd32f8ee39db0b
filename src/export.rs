//! Conversation export to CSV and JSON.

use crate::classifier::meaningful_messages;
use crate::csv_quote;
use crate::error::{IgxError, Result};
use crate::model::{Conversation, Message};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const CSV_HEADER: &str = "Date,Time,Sender,Message";

/// Export formats for a single conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

fn csv_row(message: &Message) -> String {
    let when = DateTime::<Utc>::from_timestamp_millis(message.timestamp_ms).unwrap_or_default();
    format!(
        "{},{},{},{}",
        when.format("%Y-%m-%d"),
        when.format("%H:%M:%S"),
        csv_quote(&message.sender),
        csv_quote(message.content.as_deref().unwrap_or_default()),
    )
}

/// `Date,Time,Sender,Message` rows with a header, times in UTC.
#[must_use]
pub fn messages_csv<'a>(messages: impl IntoIterator<Item = &'a Message>) -> String {
    std::iter::once(CSV_HEADER.to_string())
        .chain(messages.into_iter().map(csv_row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Meaningful messages only.
#[must_use]
pub fn export_conversation_csv(conversation: &Conversation) -> String {
    messages_csv(meaningful_messages(&conversation.messages))
}

#[derive(Serialize)]
struct JsonExport<'a> {
    id: &'a str,
    participants: Vec<&'a str>,
    message_count: usize,
    messages: Vec<&'a Message>,
}

/// The conversation record with its meaningful messages.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn export_conversation_json(conversation: &Conversation, pretty: bool) -> Result<String> {
    let messages: Vec<&Message> = meaningful_messages(&conversation.messages).collect();
    let export = JsonExport {
        id: &conversation.id,
        participants: conversation
            .participants
            .iter()
            .map(|p| p.name.as_str())
            .collect(),
        message_count: messages.len(),
        messages,
    };
    let rendered = if pretty {
        serde_json::to_string_pretty(&export)
    } else {
        serde_json::to_string(&export)
    };
    rendered.map_err(|e| IgxError::with_context("Failed to serialize conversation", e))
}

/// Render a conversation in the requested format.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn export_conversation(conversation: &Conversation, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => Ok(export_conversation_csv(conversation)),
        ExportFormat::Json => export_conversation_json(conversation, true),
    }
}

/// Default file name for an export: non-alphanumerics become `_`.
#[must_use]
pub fn export_file_name(display_name: &str, format: ExportFormat) -> String {
    let stem: String = display_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}_messages.{}", format.extension())
}
