//! Conversation-level sentiment.
//!
//! Per-message scoring is delegated to a [`SentimentScorer`]. This module
//! only fixes how those scores are labelled and aggregated. [`LexiconScorer`]
//! is a small word-list scorer used when the caller brings nothing better.

use crate::classifier::meaningful_messages;
use crate::error::Result;
use crate::model::{Message, TimestampMs};
use crate::stats_analytics::utc_date;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use unicode_normalization::UnicodeNormalization;

/// Raw output of a scorer for one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentScore {
    /// Positive is favorable, negative unfavorable. Magnitude is scorer-defined.
    pub score: f64,
    /// Score normalized by text length.
    pub comparative: f64,
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
}

/// Anything that can score a text. Must be shareable across threads since
/// messages are scored in parallel.
pub trait SentimentScorer: Sync {
    /// # Errors
    /// Implementations may fail; the failing message is then treated as neutral.
    fn score(&self, text: &str) -> Result<SentimentScore>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SentimentLabel {
    /// Label of one message: the sign of its score.
    #[must_use]
    pub fn of_message(score: f64) -> Self {
        if score > 0.0 {
            Self::Positive
        } else if score < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Label of a whole conversation from its mean score. Small means stay
    /// neutral.
    #[must_use]
    pub fn of_conversation(mean: f64) -> Self {
        if mean > 0.1 {
            Self::Positive
        } else if mean < -0.1 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    #[default]
    Low,
    Medium,
    High,
}

impl Intensity {
    #[must_use]
    pub fn of_comparative(comparative: f64) -> Self {
        let magnitude = comparative.abs();
        if magnitude >= 0.1 {
            Self::High
        } else if magnitude >= 0.05 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A scored message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentResult {
    pub score: f64,
    pub comparative: f64,
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    pub label: SentimentLabel,
    pub intensity: Intensity,
}

impl From<SentimentScore> for SentimentResult {
    fn from(raw: SentimentScore) -> Self {
        Self {
            label: SentimentLabel::of_message(raw.score),
            intensity: Intensity::of_comparative(raw.comparative),
            score: raw.score,
            comparative: raw.comparative,
            positive_words: raw.positive_words,
            negative_words: raw.negative_words,
        }
    }
}

/// Score one text. Blank text is neutral without asking the scorer, and a
/// scorer failure is logged and treated as neutral.
pub fn score_text(scorer: &dyn SentimentScorer, text: &str) -> SentimentResult {
    if text.trim().is_empty() {
        return SentimentResult::default();
    }
    match scorer.score(text) {
        Ok(raw) => raw.into(),
        Err(e) => {
            tracing::warn!(error = %e, "Sentiment scorer failed, treating message as neutral");
            SentimentResult::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremalMessage {
    pub content: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    /// Mean score of the day's messages.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub message_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSentiment {
    pub sender: String,
    pub timestamp_ms: TimestampMs,
    pub content: String,
    pub sentiment: SentimentResult,
}

/// Sentiment summary of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationSentiment {
    pub overall_score: f64,
    pub overall_label: SentimentLabel,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub total_messages: usize,
    pub most_positive_message: Option<ExtremalMessage>,
    pub most_negative_message: Option<ExtremalMessage>,
    /// Mean score per day, chronologically, over the full history.
    pub sentiment_trend: Vec<DailySentiment>,
    /// Message count per day, chronologically, over the full history.
    pub activity_trend: Vec<DailyActivity>,
    /// Every scored message in its original order.
    pub message_sentiments: Vec<MessageSentiment>,
}

impl ConversationSentiment {
    /// Score the meaningful messages and aggregate the results.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn analyze(messages: &[Message], scorer: &dyn SentimentScorer) -> Self {
        let meaningful: Vec<&Message> = meaningful_messages(messages).collect();
        if meaningful.is_empty() {
            return Self::default();
        }

        // Scored in parallel, collected back in message order
        let message_sentiments: Vec<MessageSentiment> = meaningful
            .par_iter()
            .map(|message| {
                let content = message.content.clone().unwrap_or_default();
                MessageSentiment {
                    sender: message.sender.clone(),
                    timestamp_ms: message.timestamp_ms,
                    sentiment: score_text(scorer, &content),
                    content,
                }
            })
            .collect();

        let total = message_sentiments.len();
        let overall_score =
            message_sentiments.iter().map(|m| m.sentiment.score).sum::<f64>() / total as f64;

        let count_label = |label: SentimentLabel| {
            message_sentiments
                .iter()
                .filter(|m| m.sentiment.label == label)
                .count()
        };

        let mut ranked: Vec<&MessageSentiment> = message_sentiments.iter().collect();
        ranked.sort_by(|a, b| b.sentiment.score.total_cmp(&a.sentiment.score));
        let extremal = |m: &&MessageSentiment| ExtremalMessage {
            content: m.content.clone(),
            score: m.sentiment.score,
        };
        let most_positive_message = ranked
            .first()
            .filter(|m| m.sentiment.score > 0.0)
            .map(extremal);
        let most_negative_message = ranked
            .last()
            .filter(|m| m.sentiment.score < 0.0)
            .map(extremal);

        let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for m in &message_sentiments {
            let day = by_day.entry(utc_date(m.timestamp_ms)).or_insert((0.0, 0));
            day.0 += m.sentiment.score;
            day.1 += 1;
        }
        let sentiment_trend = by_day
            .iter()
            .map(|(&date, &(sum, count))| DailySentiment {
                date,
                score: sum / count as f64,
            })
            .collect();
        let activity_trend = by_day
            .iter()
            .map(|(&date, &(_, count))| DailyActivity {
                date,
                message_count: count,
            })
            .collect();

        Self {
            overall_score,
            overall_label: SentimentLabel::of_conversation(overall_score),
            positive_count: count_label(SentimentLabel::Positive),
            negative_count: count_label(SentimentLabel::Negative),
            neutral_count: count_label(SentimentLabel::Neutral),
            total_messages: total,
            most_positive_message,
            most_negative_message,
            sentiment_trend,
            activity_trend,
            message_sentiments,
        }
    }
}

// ============================================================================
// Built-in lexicon scorer
// ============================================================================

/// AFINN-style word weights from -5 to 5.
const LEXICON: &[(&str, i32)] = &[
    ("amazing", 4),
    ("awesome", 4),
    ("beautiful", 3),
    ("best", 3),
    ("better", 2),
    ("brilliant", 4),
    ("congrats", 2),
    ("congratulations", 2),
    ("cool", 1),
    ("cute", 2),
    ("excited", 3),
    ("excellent", 3),
    ("fantastic", 4),
    ("fun", 4),
    ("glad", 3),
    ("good", 3),
    ("great", 3),
    ("haha", 3),
    ("happy", 3),
    ("hope", 2),
    ("like", 2),
    ("lol", 3),
    ("love", 3),
    ("lovely", 3),
    ("nice", 3),
    ("perfect", 3),
    ("proud", 2),
    ("thank", 2),
    ("thanks", 2),
    ("wonderful", 4),
    ("wow", 4),
    ("yay", 2),
    ("yes", 1),
    ("afraid", -2),
    ("angry", -3),
    ("annoyed", -2),
    ("annoying", -2),
    ("awful", -3),
    ("bad", -3),
    ("bored", -2),
    ("boring", -3),
    ("cry", -1),
    ("disappointed", -2),
    ("hate", -3),
    ("horrible", -3),
    ("hurt", -2),
    ("mad", -3),
    ("miss", -2),
    ("no", -1),
    ("sad", -2),
    ("scared", -2),
    ("sick", -2),
    ("sorry", -1),
    ("stupid", -2),
    ("terrible", -3),
    ("tired", -2),
    ("ugh", -2),
    ("upset", -2),
    ("worried", -3),
    ("worst", -3),
    ("wrong", -2),
];

/// Tokens that flip the weight of the word right after them.
const NEGATORS: &[&str] = &["not", "don't", "dont", "never", "isn't", "wasn't", "can't", "won't"];

static LEXICON_MAP: Lazy<HashMap<&'static str, i32>> =
    Lazy::new(|| LEXICON.iter().copied().collect());

/// Word-list scorer: `score` is the sum of matched weights and
/// `comparative` divides it by the number of tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn tokenize(text: &str) -> Vec<String> {
        let normalized: String = text.nfkc().collect::<String>().to_lowercase();
        normalized
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .map(|t| t.trim_matches('\''))
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<SentimentScore> {
        let tokens = Self::tokenize(text);
        let mut result = SentimentScore::default();
        if tokens.is_empty() {
            return Ok(result);
        }

        let mut total = 0_i32;
        for (i, token) in tokens.iter().enumerate() {
            let Some(&weight) = LEXICON_MAP.get(token.as_str()) else {
                continue;
            };
            let negated = i > 0 && NEGATORS.contains(&tokens[i - 1].as_str());
            let weight = if negated { -weight } else { weight };
            total += weight;
            if weight > 0 {
                result.positive_words.push(token.clone());
            } else if weight < 0 {
                result.negative_words.push(token.clone());
            }
        }

        result.score = f64::from(total);
        #[allow(clippy::cast_precision_loss)]
        let token_count = tokens.len() as f64;
        result.comparative = result.score / token_count;
        Ok(result)
    }
}
