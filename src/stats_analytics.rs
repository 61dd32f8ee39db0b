//! Conversation statistics and analytics.
//!
//! Everything here works on a plain message slice, so it can be used on a
//! loaded [`crate::Dataset`] or on messages from anywhere else:
//! - Message counts by kind (attachments, reactions, calls, media)
//! - Response-time analysis (who answers, how fast, who starts)
//! - Momentum (peak days, quiet stretches, activity trend)

use crate::classifier::{
    is_attachment_notice, is_audio_call_notice, is_like_notice, is_meaningful,
    is_reaction_notice, is_share_notice, meaningful_messages,
};
use crate::model::{Message, TimestampMs};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 3_600_000.0;
const DAY_MS: f64 = 86_400_000.0;

/// A silence longer than this starts a new sub-conversation.
pub const NEW_CONVERSATION_GAP_MINUTES: f64 = 120.0;
/// Replies slower than this are not counted as responses.
pub const RESPONSE_CEILING_MINUTES: f64 = 1440.0;
/// Replies at or under this count as quick.
pub const QUICK_RESPONSE_MINUTES: f64 = 60.0;
/// Gaps longer than this are quiet periods.
pub const QUIET_PERIOD_DAYS: f64 = 7.0;
/// Days need at least this many messages to be a peak.
pub const MIN_PEAK_MESSAGES: f64 = 5.0;

const MAX_PEAK_PERIODS: usize = 10;
const MAX_QUIET_PERIODS: usize = 5;

/// UTC calendar date of a millisecond timestamp.
#[must_use]
pub fn utc_date(timestamp_ms: TimestampMs) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}

fn sorted_meaningful(messages: &[Message]) -> Vec<&Message> {
    let mut meaningful: Vec<&Message> = meaningful_messages(messages).collect();
    meaningful.sort_by_key(|m| m.timestamp_ms);
    meaningful
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

// ============================================================================
// Message Statistics
// ============================================================================

/// Counts by message kind for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageStats {
    pub total_messages: usize,
    pub meaningful_messages: usize,
    pub attachments: usize,
    pub reactions: usize,
    pub likes: usize,
    pub media_shares: usize,
    /// Number of photo attachments, not messages with photos.
    pub photos: usize,
    pub videos: usize,
    pub audio_calls: usize,
    pub response_time: ResponseTimeAnalysis,
}

impl MessageStats {
    /// Tally every message, including system notices.
    #[must_use]
    pub fn compute(messages: &[Message]) -> Self {
        let mut stats = Self {
            total_messages: messages.len(),
            response_time: ResponseTimeAnalysis::compute(messages),
            ..Self::default()
        };

        for message in messages {
            if is_meaningful(message) {
                stats.meaningful_messages += 1;
            }

            if let Some(content) = message.content.as_deref() {
                stats.attachments += usize::from(is_attachment_notice(content));
                stats.reactions += usize::from(is_reaction_notice(content));
                stats.likes += usize::from(is_like_notice(content));
                stats.media_shares += usize::from(is_share_notice(content));
                stats.audio_calls += usize::from(is_audio_call_notice(content));
            }

            stats.photos += message.photos.len();
            stats.videos += message.videos.len();
        }

        stats
    }
}

// ============================================================================
// Response Time Analysis
// ============================================================================

/// Response statistics for one sender. Times are in minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParticipantResponseStats {
    pub average_response_time: f64,
    pub total_responses: usize,
    pub fastest_response: f64,
    pub slowest_response: f64,
}

/// How quickly participants reply to each other. Times are in minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseTimeAnalysis {
    pub average_response_time: f64,
    /// Lower median for an even number of responses.
    pub median_response_time: f64,
    pub fastest_response: f64,
    pub slowest_response: f64,
    pub by_participant: BTreeMap<String, ParticipantResponseStats>,
    /// How often each sender opened a conversation or broke a long silence.
    pub conversation_starters: BTreeMap<String, usize>,
    /// Percentage of each sender's responses that were quick.
    pub responsiveness: BTreeMap<String, f64>,
}

impl ResponseTimeAnalysis {
    /// Analyze the meaningful messages of a conversation in any order.
    ///
    /// Returns the empty analysis when fewer than two meaningful messages
    /// exist.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(messages: &[Message]) -> Self {
        let sorted = sorted_meaningful(messages);
        let Some((first, rest)) = sorted.split_first() else {
            return Self::default();
        };
        if rest.is_empty() {
            return Self::default();
        }

        let mut per_sender: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        let mut starters: BTreeMap<&str, usize> = BTreeMap::new();
        let mut quick: BTreeMap<&str, usize> = BTreeMap::new();
        for message in &sorted {
            let sender = message.sender.as_str();
            per_sender.entry(sender).or_default();
            starters.entry(sender).or_insert(0);
            quick.entry(sender).or_insert(0);
        }

        let mut all_times: Vec<f64> = Vec::new();
        *starters.entry(first.sender.as_str()).or_insert(0) += 1;

        let mut prev = *first;
        for &message in rest {
            let gap = (message.timestamp_ms - prev.timestamp_ms) as f64 / MINUTE_MS;
            let sender = message.sender.as_str();

            if gap > NEW_CONVERSATION_GAP_MINUTES {
                *starters.entry(sender).or_insert(0) += 1;
            } else if sender != prev.sender && gap > 0.0 && gap < RESPONSE_CEILING_MINUTES {
                all_times.push(gap);
                per_sender.entry(sender).or_default().push(gap);
                if gap <= QUICK_RESPONSE_MINUTES {
                    *quick.entry(sender).or_insert(0) += 1;
                }
            }

            prev = message;
        }

        let mut sorted_times = all_times.clone();
        sorted_times.sort_by(f64::total_cmp);
        let median_response_time = sorted_times.get(sorted_times.len() / 2).copied().unwrap_or(0.0);
        let (fastest_response, slowest_response) = min_max(&all_times);

        let mut by_participant = BTreeMap::new();
        let mut responsiveness = BTreeMap::new();
        for (sender, times) in &per_sender {
            let (fastest, slowest) = min_max(times);
            by_participant.insert(
                (*sender).to_string(),
                ParticipantResponseStats {
                    average_response_time: mean(times),
                    total_responses: times.len(),
                    fastest_response: fastest,
                    slowest_response: slowest,
                },
            );

            let quick_count = quick.get(sender).copied().unwrap_or(0);
            let score = if times.is_empty() {
                0.0
            } else {
                quick_count as f64 / times.len() as f64 * 100.0
            };
            responsiveness.insert((*sender).to_string(), score);
        }

        Self {
            average_response_time: mean(&all_times),
            median_response_time,
            fastest_response,
            slowest_response,
            by_participant,
            conversation_starters: starters
                .into_iter()
                .map(|(sender, count)| (sender.to_string(), count))
                .collect(),
            responsiveness,
        }
    }

    /// Number of responses recorded across all senders.
    #[must_use]
    pub fn total_responses(&self) -> usize {
        self.by_participant.values().map(|p| p.total_responses).sum()
    }
}

// ============================================================================
// Momentum
// ============================================================================

/// Direction of activity between the two halves of a conversation's life.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// A day with unusually many messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeakPeriod {
    pub date: NaiveDate,
    pub message_count: usize,
}

/// A stretch of more than a week without messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuietPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
}

/// Activity shape of a conversation over time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationMomentum {
    /// Up to 10 busiest qualifying days, busiest first.
    pub peak_periods: Vec<PeakPeriod>,
    /// Up to 5 longest silences, longest first.
    pub quiet_periods: Vec<QuietPeriod>,
    pub overall_trend: Trend,
    /// Mean gap between consecutive messages, in hours.
    pub average_gap_hours: f64,
    /// Longest silence in days, 0 when there is none.
    pub longest_quiet_period: i64,
}

impl ConversationMomentum {
    /// Analyze the meaningful messages of a conversation in any order.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn compute(messages: &[Message]) -> Self {
        let sorted = sorted_meaningful(messages);
        if sorted.len() < 2 {
            return Self::default();
        }

        // Peak days
        let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for message in &sorted {
            *by_day.entry(utc_date(message.timestamp_ms)).or_insert(0) += 1;
        }
        let average_daily = sorted.len() as f64 / by_day.len() as f64;
        let threshold = (average_daily * 1.5).max(MIN_PEAK_MESSAGES);

        let mut peak_periods: Vec<PeakPeriod> = by_day
            .iter()
            .filter(|&(_, &count)| count as f64 >= threshold)
            .map(|(&date, &count)| PeakPeriod {
                date,
                message_count: count,
            })
            .collect();
        peak_periods.sort_by(|a, b| b.message_count.cmp(&a.message_count));
        peak_periods.truncate(MAX_PEAK_PERIODS);

        // Quiet periods and gaps
        let mut quiet_periods = Vec::new();
        let mut gaps_hours = Vec::with_capacity(sorted.len() - 1);
        for pair in sorted.windows(2) {
            let delta = (pair[1].timestamp_ms - pair[0].timestamp_ms) as f64;
            gaps_hours.push(delta / HOUR_MS);

            let gap_days = delta / DAY_MS;
            if gap_days > QUIET_PERIOD_DAYS {
                quiet_periods.push(QuietPeriod {
                    start_date: utc_date(pair[0].timestamp_ms),
                    end_date: utc_date(pair[1].timestamp_ms),
                    duration_days: gap_days.round() as i64,
                });
            }
        }
        let longest_quiet_period = quiet_periods
            .iter()
            .map(|p| p.duration_days)
            .max()
            .unwrap_or(0);
        quiet_periods.sort_by(|a, b| b.duration_days.cmp(&a.duration_days));
        quiet_periods.truncate(MAX_QUIET_PERIODS);

        Self {
            peak_periods,
            quiet_periods,
            overall_trend: trend(&sorted),
            average_gap_hours: mean(&gaps_hours),
            longest_quiet_period,
        }
    }
}

/// Compare message rates before and after the temporal midpoint.
#[allow(clippy::cast_precision_loss)]
fn trend(sorted: &[&Message]) -> Trend {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Trend::Stable;
    };
    let start = first.timestamp_ms;
    let span = last.timestamp_ms - start;

    // `ts <= start + span / 2` without losing the half millisecond
    let split = sorted.partition_point(|m| 2 * (m.timestamp_ms - start) <= span);
    let (first_half, second_half) = sorted.split_at(split);

    let rate = |half: &[&Message]| -> f64 {
        let days = match (half.first(), half.last()) {
            (Some(a), Some(b)) if half.len() > 1 => {
                (b.timestamp_ms - a.timestamp_ms) as f64 / DAY_MS
            }
            _ => 1.0,
        };
        half.len() as f64 / days.max(1.0)
    };

    let first_rate = rate(first_half);
    let second_rate = rate(second_half);

    if second_rate > first_rate * 1.3 {
        Trend::Increasing
    } else if second_rate < first_rate * 0.7 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

// ============================================================================
// Daily activity
// ============================================================================

/// A single day's meaningful message count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Meaningful messages per UTC day, chronologically.
#[must_use]
pub fn daily_counts(messages: &[Message]) -> Vec<DailyCount> {
    let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for message in meaningful_messages(messages) {
        *by_day.entry(utc_date(message.timestamp_ms)).or_insert(0) += 1;
    }
    by_day
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// Generate an ASCII sparkline from a slice of values.
///
/// Uses Unicode block characters: ▁▂▃▄▅▆▇█
///
/// # Arguments
/// * `values` - The values to visualize
/// * `width` - Target width (values will be bucketed if len > width)
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn sparkline(values: &[u64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let blocks = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    let bucketed: Vec<u64> = if values.len() <= width {
        values.to_vec()
    } else {
        let bucket_size = values.len().div_ceil(width);
        values
            .chunks(bucket_size)
            .map(|chunk| chunk.iter().sum::<u64>() / chunk.len() as u64)
            .collect()
    };

    let max = *bucketed.iter().max().unwrap_or(&1);
    if max == 0 {
        return "▁".repeat(bucketed.len().min(width));
    }

    bucketed
        .iter()
        .take(width)
        .map(|&v| {
            let idx = ((v as f64 / max as f64) * 7.0) as usize;
            blocks[idx.min(7)]
        })
        .collect()
}

/// Generate a sparkline from daily counts.
#[must_use]
pub fn sparkline_from_daily(daily_counts: &[DailyCount], width: usize) -> String {
    let values: Vec<u64> = daily_counts.iter().map(|d| d.count).collect();
    sparkline(&values, width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attachment;

    const MIN: i64 = 60_000;
    const HOUR: i64 = 60 * MIN;
    const DAY: i64 = 24 * HOUR;
    // 2024-01-01T00:00:00Z
    const T0: i64 = 1_704_067_200_000;

    fn msg(sender: &str, t: i64, content: &str) -> Message {
        Message::text(sender, t, content)
    }

    // =========================================================================
    // Message stats
    // =========================================================================

    #[test]
    fn test_message_stats_counts() {
        let mut photo = msg("Alice", T0, "look");
        photo.photos = vec![Attachment::default(), Attachment::default()];
        let messages = vec![
            photo,
            msg("Bob", T0 + MIN, "Bob sent an attachment."),
            msg("Bob", T0 + 2 * MIN, "Reacted 😂 to your message "),
            msg("Alice", T0 + 3 * MIN, "liked a message"),
            msg("Alice", T0 + 4 * MIN, "Alice shared a reel."),
            msg("Bob", T0 + 5 * MIN, "You started an audio call"),
            msg("Bob", T0 + 6 * MIN, "nice!"),
            Message::default(),
        ];

        let stats = MessageStats::compute(&messages);
        assert_eq!(stats.total_messages, 8);
        assert_eq!(stats.meaningful_messages, 2);
        assert_eq!(stats.attachments, 1);
        assert_eq!(stats.reactions, 1);
        assert_eq!(stats.likes, 1);
        assert_eq!(stats.media_shares, 1);
        assert_eq!(stats.audio_calls, 1);
        assert_eq!(stats.photos, 2);
        assert_eq!(stats.videos, 0);
        assert_eq!(stats.response_time.total_responses(), 1);
    }

    // =========================================================================
    // Response time
    // =========================================================================

    #[test]
    fn test_response_and_new_conversation() {
        let messages = vec![
            msg("X", 0, "A"),
            msg("Y", 30 * MIN, "B"),
            msg("X", 200 * HOUR, "C"),
        ];
        let analysis = ResponseTimeAnalysis::compute(&messages);

        assert!((analysis.average_response_time - 30.0).abs() < f64::EPSILON);
        assert!((analysis.median_response_time - 30.0).abs() < f64::EPSILON);
        assert_eq!(analysis.by_participant["Y"].total_responses, 1);
        assert_eq!(analysis.by_participant["X"].total_responses, 0);
        // A opened, C broke a long silence
        assert_eq!(analysis.conversation_starters["X"], 2);
        assert_eq!(analysis.conversation_starters["Y"], 0);
        assert!((analysis.responsiveness["Y"] - 100.0).abs() < f64::EPSILON);
        assert!(analysis.responsiveness["X"].abs() < f64::EPSILON);
    }

    #[test]
    fn test_response_time_ignores_input_order() {
        let ordered = vec![msg("X", 0, "a"), msg("Y", 10 * MIN, "b"), msg("X", 25 * MIN, "c")];
        let mut reversed = ordered.clone();
        reversed.reverse();
        assert_eq!(
            ResponseTimeAnalysis::compute(&ordered),
            ResponseTimeAnalysis::compute(&reversed)
        );
    }

    #[test]
    fn test_lower_median_and_extremes() {
        let messages = vec![
            msg("X", 0, "a"),
            msg("Y", 10 * MIN, "b"),
            msg("X", 30 * MIN, "c"),
            msg("Y", 70 * MIN, "d"),
            msg("X", 150 * MIN, "e"),
        ];
        // gaps: 10, 20, 40, 80
        let analysis = ResponseTimeAnalysis::compute(&messages);
        assert!((analysis.median_response_time - 40.0).abs() < f64::EPSILON);
        assert!((analysis.fastest_response - 10.0).abs() < f64::EPSILON);
        assert!((analysis.slowest_response - 80.0).abs() < f64::EPSILON);
        assert!((analysis.average_response_time - 37.5).abs() < f64::EPSILON);
        // X answered in 20 and 80 minutes
        assert!((analysis.responsiveness["X"] - 50.0).abs() < f64::EPSILON);
        assert!((analysis.by_participant["X"].slowest_response - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_sender_and_simultaneous_messages() {
        let messages = vec![
            msg("X", 0, "a"),
            msg("X", 5 * MIN, "b"),
            msg("Y", 5 * MIN, "c"),
        ];
        let analysis = ResponseTimeAnalysis::compute(&messages);
        assert_eq!(analysis.total_responses(), 0);
        assert_eq!(analysis.conversation_starters["X"], 1);
    }

    #[test]
    fn test_response_time_skips_system_messages() {
        let messages = vec![
            msg("X", 0, "hello"),
            msg("Y", MIN, "Reacted 👍 to your message"),
            msg("Y", 20 * MIN, "hey"),
        ];
        let analysis = ResponseTimeAnalysis::compute(&messages);
        assert_eq!(analysis.total_responses(), 1);
        assert!((analysis.fastest_response - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_response_time_empty_input() {
        assert_eq!(ResponseTimeAnalysis::compute(&[]), ResponseTimeAnalysis::default());
        let one = vec![msg("X", 0, "alone")];
        let analysis = ResponseTimeAnalysis::compute(&one);
        assert!(analysis.conversation_starters.is_empty());
    }

    // =========================================================================
    // Momentum
    // =========================================================================

    #[test]
    fn test_increasing_trend() {
        let mut messages = Vec::new();
        for day in 0..10 {
            for hour in 0..2 {
                messages.push(msg("X", T0 + day * DAY + (10 + hour) * HOUR, "slow"));
            }
        }
        for day in 10..20 {
            for hour in 0..10 {
                messages.push(msg("Y", T0 + day * DAY + (10 + hour) * HOUR, "busy"));
            }
        }

        let momentum = ConversationMomentum::compute(&messages);
        assert_eq!(momentum.overall_trend, Trend::Increasing);
        // Mean is 6 per day so the threshold is 9
        assert_eq!(momentum.peak_periods.len(), 10);
        assert!(momentum.peak_periods.iter().all(|p| p.message_count == 10));
        assert!(momentum.quiet_periods.is_empty());
        assert_eq!(momentum.longest_quiet_period, 0);
    }

    #[test]
    fn test_decreasing_trend() {
        let mut messages = Vec::new();
        for day in 0..10 {
            for hour in 0..10 {
                messages.push(msg("X", T0 + day * DAY + (8 + hour) * HOUR, "busy"));
            }
        }
        for day in 10..20 {
            messages.push(msg("Y", T0 + day * DAY + 12 * HOUR, "slow"));
        }
        let momentum = ConversationMomentum::compute(&messages);
        assert_eq!(momentum.overall_trend, Trend::Decreasing);
    }

    #[test]
    fn test_quiet_periods() {
        let messages = vec![
            msg("X", T0, "a"),
            msg("Y", T0 + 10 * DAY, "b"),
            msg("X", T0 + 11 * DAY, "c"),
            msg("Y", T0 + 31 * DAY + 12 * HOUR, "d"),
        ];
        let momentum = ConversationMomentum::compute(&messages);
        assert_eq!(momentum.quiet_periods.len(), 2);
        // 20.5 days rounds to 21
        assert_eq!(momentum.quiet_periods[0].duration_days, 21);
        assert_eq!(momentum.quiet_periods[1].duration_days, 10);
        assert_eq!(momentum.longest_quiet_period, 21);
        assert_eq!(
            momentum.quiet_periods[1].start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            momentum.quiet_periods[1].end_date,
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
    }

    #[test]
    fn test_peak_periods_keep_ten_busiest() {
        let mut messages = Vec::new();
        // 12 busy days with 10..=21 messages each
        for day in 0..12 {
            for i in 0..(10 + day) {
                messages.push(msg("X", T0 + day * DAY + 8 * HOUR + i * MIN, "busy"));
            }
        }
        // 30 slow days keep the threshold near 7.7
        for day in 12..42 {
            messages.push(msg("Y", T0 + day * DAY + 12 * HOUR, "slow"));
        }

        let momentum = ConversationMomentum::compute(&messages);
        assert_eq!(momentum.peak_periods.len(), 10);
        assert!(momentum
            .peak_periods
            .windows(2)
            .all(|w| w[0].message_count > w[1].message_count));
        assert_eq!(momentum.peak_periods[0].message_count, 21);
        assert_eq!(
            momentum.peak_periods[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
        );
        assert_eq!(momentum.peak_periods[9].message_count, 12);
    }

    #[test]
    fn test_quiet_periods_keep_five_longest() {
        let gaps_days = [8, 20, 9, 13, 10, 12, 11];
        let mut t = T0;
        let mut messages = vec![msg("X", t, "start")];
        for gap in gaps_days {
            t += gap * DAY;
            messages.push(msg("Y", t, "back"));
        }

        let momentum = ConversationMomentum::compute(&messages);
        let durations: Vec<i64> = momentum
            .quiet_periods
            .iter()
            .map(|p| p.duration_days)
            .collect();
        assert_eq!(durations, vec![20, 13, 12, 11, 10]);
        assert_eq!(momentum.longest_quiet_period, 20);
        assert_eq!(
            momentum.quiet_periods[0].start_date,
            NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()
        );
    }

    #[test]
    fn test_average_gap_hours() {
        let messages = vec![msg("X", T0, "a"), msg("Y", T0 + 2 * HOUR, "b"), msg("X", T0 + 6 * HOUR, "c")];
        let momentum = ConversationMomentum::compute(&messages);
        assert!((momentum.average_gap_hours - 3.0).abs() < 1e-9);
        assert!(momentum.peak_periods.is_empty());
    }

    #[test]
    fn test_momentum_empty_input() {
        assert_eq!(ConversationMomentum::compute(&[]), ConversationMomentum::default());
        let system_only = vec![msg("X", 0, "Sent an attachment."), msg("Y", 1, "liked a message")];
        let momentum = ConversationMomentum::compute(&system_only);
        assert_eq!(momentum.overall_trend, Trend::Stable);
        assert!(momentum.average_gap_hours.abs() < f64::EPSILON);
    }

    #[test]
    fn test_daily_counts() {
        let messages = vec![
            msg("X", T0 + DAY, "b"),
            msg("X", T0, "a"),
            msg("Y", T0 + HOUR, "a2"),
            msg("Y", T0 + 2 * HOUR, "Sent an attachment."),
        ];
        let counts = daily_counts(&messages);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    // =========================================================================
    // Sparkline
    // =========================================================================

    #[test]
    fn test_sparkline_empty() {
        assert_eq!(sparkline(&[], 10), "");
    }

    #[test]
    fn test_sparkline_values() {
        let result = sparkline(&[1, 5, 10, 8, 3, 1], 6);
        assert_eq!(result.chars().count(), 6);
        assert!(result.contains('█'));
        assert!(result.contains('▁'));
    }

    #[test]
    fn test_sparkline_all_zeros() {
        assert_eq!(sparkline(&[0, 0, 0, 0], 4), "▁▁▁▁");
    }

    #[test]
    fn test_sparkline_bucketing() {
        let values: Vec<u64> = (1..=12).collect();
        assert_eq!(sparkline(&values, 6).chars().count(), 6);
    }
}
