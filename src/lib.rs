//! igx - Instagram data export analytics
//!
//! This library reads the JSON export Instagram produces ("Download your
//! information"), reconstructs conversations, connections and activity
//! records from it, and computes conversation analytics.
//!
//! # Modules
//!
//! - [`archive`] - Uniform access to zipped or unpacked exports
//! - [`encoding`] - Mojibake repair for exported text
//! - [`parser`] - Export parsing and conversation reconstruction
//! - [`classifier`] - System-notice detection for messages
//! - [`stats_analytics`] - Response time, momentum and message statistics
//! - [`sentiment`] - Sentiment aggregation over a pluggable scorer
//! - [`connections`] - Follower and following set arithmetic
//! - [`session`] - Loaded dataset and its accessors
//! - [`error`] - Custom error types with rich context

pub mod archive;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod connections;
pub mod doctor;
pub mod encoding;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod parser;
pub mod sentiment;
pub mod session;
pub mod stats_analytics;

pub use archive::{ArchiveReader, DirectoryArchive, ZipArchiveReader, extract_archive, open_archive};
pub use classifier::{MessageKind, is_meaningful};
pub use cli::*;
pub use connections::RelationshipSets;
pub use error::{
    IgxError, Result, VALID_CONFIG_KEYS, VALID_OUTPUT_FORMATS, find_closest_match,
    format_did_you_mean, format_error, format_unknown_value_error,
};
pub use model::*;
pub use parser::ArchiveParser;
pub use sentiment::{ConversationSentiment, LexiconScorer, SentimentScore, SentimentScorer};
pub use session::{AnalysisSession, Dataset, OwnerIdentity, SectionError};
pub use stats_analytics::{ConversationMomentum, MessageStats, ResponseTimeAnalysis, Trend};

use chrono::{DateTime, Datelike, Utc};

/// Standard width for content dividers in CLI output
pub const CONTENT_DIVIDER_WIDTH: usize = 60;

/// Standard width for major header dividers in CLI output
pub const HEADER_DIVIDER_WIDTH: usize = 70;

/// Format an integer with thousands separators.
#[must_use]
pub fn format_number(value: i64) -> String {
    let abs = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(abs.len() + abs.len() / 3);

    for (idx, ch) in abs.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut formatted: String = out.chars().rev().collect();
    if value < 0 {
        formatted.insert(0, '-');
    }
    formatted
}

/// Format a usize with thousands separators.
#[must_use]
pub fn format_number_usize(value: usize) -> String {
    format_number(i64::try_from(value).unwrap_or(i64::MAX))
}

/// Format a span given in minutes for display.
///
/// - < 0.1 minute: "Instant"
/// - < 1 minute: "Ns"
/// - < 1 hour: "N min"
/// - < 24 hours: "Hh Mm", or "Hh" on the hour
/// - otherwise: "1 day", "N days", or "Nd Hh"
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_duration(minutes: f64) -> String {
    if minutes < 0.1 {
        "Instant".to_string()
    } else if minutes < 1.0 {
        format!("{}s", (minutes * 60.0).round() as i64)
    } else if minutes < 60.0 {
        format!("{} min", minutes.round() as i64)
    } else if minutes < 1440.0 {
        let total = minutes.round() as i64;
        let (hours, mins) = (total / 60, total % 60);
        if mins > 0 {
            format!("{hours}h {mins}m")
        } else {
            format!("{hours}h")
        }
    } else {
        let days = (minutes / 1440.0).floor() as i64;
        let hours = ((minutes % 1440.0) / 60.0).floor() as i64;
        match (days, hours) {
            (1, 0) => "1 day".to_string(),
            (_, 0) => format!("{days} days"),
            _ => format!("{days}d {hours}h"),
        }
    }
}

/// Format a datetime as a human-friendly relative string.
///
/// - < 1 minute: "just now"
/// - < 1 hour: "Nm ago"
/// - < 24 hours: "Nh ago"
/// - < 7 days: "Nd ago"
/// - Same calendar year: "Mon D"
/// - Different year: "Mon D, YYYY"
#[must_use]
pub fn format_relative_date(dt: DateTime<Utc>) -> String {
    format_relative_date_with_base(dt, Utc::now())
}

/// Format a datetime relative to a fixed base time (useful for tests).
#[must_use]
pub fn format_relative_date_with_base(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(dt);

    if duration.num_seconds() < 0 {
        return dt.format("%b %d, %Y").to_string();
    }

    let minutes = duration.num_minutes();
    let hours = duration.num_hours();
    let days = duration.num_days();

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else if dt.year() == now.year() {
        dt.format("%b %d").to_string()
    } else {
        dt.format("%b %d, %Y").to_string()
    }
}

/// Relative date for a millisecond timestamp, "never" for zero.
#[must_use]
pub fn format_timestamp_ms(timestamp_ms: i64) -> String {
    if timestamp_ms == 0 {
        return "never".to_string();
    }
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map_or_else(|| "unknown".to_string(), format_relative_date)
}

/// Quote a CSV field, doubling embedded quotes.
#[must_use]
pub fn csv_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::{csv_quote, format_duration, format_number, format_relative_date_with_base};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn format_number_adds_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(12_345_678), "12,345,678");
        assert_eq!(format_number(-12_345), "-12,345");
    }

    #[test]
    fn format_duration_thresholds() {
        assert_eq!(format_duration(0.05), "Instant");
        assert_eq!(format_duration(0.5), "30s");
        assert_eq!(format_duration(12.4), "12 min");
        assert_eq!(format_duration(60.0), "1h");
        assert_eq!(format_duration(135.0), "2h 15m");
        assert_eq!(format_duration(1440.0), "1 day");
        assert_eq!(format_duration(2880.0), "2 days");
        assert_eq!(format_duration(1440.0 + 180.0), "1d 3h");
    }

    #[test]
    fn format_duration_rounds_to_whole_hour() {
        assert_eq!(format_duration(119.7), "2h");
    }

    #[test]
    fn format_relative_date_thresholds() {
        let base = Utc
            .with_ymd_and_hms(2025, 1, 10, 12, 0, 0)
            .single()
            .unwrap();

        assert_eq!(
            format_relative_date_with_base(base - Duration::seconds(30), base),
            "just now"
        );
        assert_eq!(
            format_relative_date_with_base(base - Duration::hours(3), base),
            "3h ago"
        );
        assert_eq!(
            format_relative_date_with_base(base - Duration::days(2), base),
            "2d ago"
        );

        let different_year = Utc
            .with_ymd_and_hms(2024, 12, 11, 0, 0, 0)
            .single()
            .unwrap();
        assert_eq!(
            format_relative_date_with_base(different_year, base),
            "Dec 11, 2024"
        );
    }

    #[test]
    fn csv_quote_doubles_quotes() {
        assert_eq!(csv_quote(r#"say "hi", ok"#), r#""say ""hi"", ok""#);
        assert_eq!(csv_quote(""), r#""""#);
    }
}
