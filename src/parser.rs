//! Instagram export parser.
//!
//! Reads the JSON files of an export through an [`ArchiveReader`], repairs
//! their text encoding, and turns them into the records in [`crate::model`].
//! Conversations and the two connection lists are required; every
//! engagement, search and impressions file is optional and falls back to an
//! empty collection.

use crate::archive::{ArchiveReader, INBOX_PREFIX, paths};
use crate::encoding::repair_value;
use crate::error::{IgxError, Result};
use crate::model::raw::{self, Entry};
use crate::model::{
    CommentData, Conversation, EngagementData, FollowerData, LikeData, Message, Participant,
    ParticipantStatus, PostView, ProfileSearch, SavedData, SearchData, StoryLikeData, WordSearch,
};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

static CONVERSATION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)_(\d+)$").expect("valid regex"));

/// Parser over any export source.
pub struct ArchiveParser<'a> {
    reader: &'a dyn ArchiveReader,
}

impl<'a> ArchiveParser<'a> {
    pub fn new(reader: &'a dyn ArchiveReader) -> Self {
        Self { reader }
    }

    /// Read an entry and parse it as JSON with encoding repair applied.
    fn read_json(&self, path: &str) -> Result<Value> {
        let content = self.reader.read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| IgxError::parse_error(path, format!("Invalid JSON: {e}")))?;
        Ok(repair_value(value))
    }

    /// Read an entry into its export shape.
    fn read_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.read_json(path)?;
        serde_json::from_value(value)
            .map_err(|e| IgxError::parse_error(path, format!("Unexpected layout: {e}")))
    }

    /// Read an optional entry, degrading to the empty shape on any failure.
    fn read_optional<T: DeserializeOwned + Default>(&self, path: &str) -> T {
        match self.read_typed(path) {
            Ok(parsed) => parsed,
            Err(e) if e.is_not_found() => {
                debug!(file = path, "Optional file not present");
                T::default()
            }
            Err(e) => {
                debug!(file = path, error = %e, "Optional file unreadable, using empty");
                T::default()
            }
        }
    }

    // =========================================================================
    // Conversations
    // =========================================================================

    /// Group inbox entries by conversation directory.
    ///
    /// Every immediate subdirectory of the inbox is a conversation; only its
    /// direct `message_*.json` children are message fragments.
    fn conversation_partitions(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let entries = self.reader.list_entries(INBOX_PREFIX)?;
        if entries.is_empty() {
            return Err(IgxError::missing_file(INBOX_PREFIX));
        }

        let mut partitions: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in entries {
            let Some(rest) = entry.strip_prefix(INBOX_PREFIX) else {
                continue;
            };
            let Some((dir, file)) = rest.split_once('/') else {
                continue;
            };
            let fragments = partitions.entry(dir.to_string()).or_default();
            if is_message_fragment(file) {
                fragments.push(entry);
            }
        }

        for fragments in partitions.values_mut() {
            fragments.sort_by_key(|path| fragment_order(path));
        }
        Ok(partitions)
    }

    /// Parse every conversation in the inbox, keyed by directory name.
    ///
    /// # Errors
    /// Returns [`IgxError::MissingArchiveFile`] if the export has no inbox and
    /// [`IgxError::ParseError`] if any message fragment is malformed.
    pub fn parse_conversations(&self) -> Result<BTreeMap<String, Conversation>> {
        info!("Parsing conversations from {}", self.reader.describe());
        let partitions = self.conversation_partitions()?;

        let conversations: BTreeMap<String, Conversation> = partitions
            .into_par_iter()
            .map(|(id, fragment_paths)| -> Result<(String, Conversation)> {
                let fragments = fragment_paths
                    .iter()
                    .map(|path| self.read_typed::<raw::ConversationFragment>(path))
                    .collect::<Result<Vec<_>>>()?;
                let conversation = merge_fragments(id.clone(), fragments);
                Ok((id, conversation))
            })
            .collect::<Result<_>>()?;

        let total_messages: usize = conversations.values().map(|c| c.messages.len()).sum();
        info!(
            "Parsed {} conversations with {} total messages",
            conversations.len(),
            total_messages
        );
        Ok(conversations)
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Parse `followers_1.json`.
    ///
    /// # Errors
    /// Returns an error if the file is missing or malformed.
    pub fn parse_followers(&self) -> Result<Vec<FollowerData>> {
        let entries: raw::FollowersExport = self.read_typed(paths::FOLLOWERS)?;
        let followers = flatten_relationships(&entries);
        info!("Parsed {} followers", followers.len());
        Ok(followers)
    }

    /// Parse `following.json`.
    ///
    /// # Errors
    /// Returns an error if the file is missing or malformed.
    pub fn parse_following(&self) -> Result<Vec<FollowerData>> {
        let export: raw::FollowingExport = self.read_typed(paths::FOLLOWING)?;
        let following = flatten_relationships(&export.relationships_following);
        info!("Parsed {} following", following.len());
        Ok(following)
    }

    // =========================================================================
    // Engagement, searches, impressions
    // =========================================================================

    /// Parse the four engagement categories independently.
    pub fn parse_engagement(&self) -> EngagementData {
        let likes = self
            .read_optional::<raw::LikesExport>(paths::LIKES)
            .likes_media_likes
            .iter()
            .map(|entry| {
                let item = entry.first_item();
                LikeData {
                    title: entry.title(),
                    href: item.and_then(|i| i.href.clone()).unwrap_or_default(),
                    timestamp: item.and_then(|i| i.timestamp).unwrap_or(0),
                }
            })
            .collect();

        let comments = self
            .read_optional::<raw::CommentsExport>(paths::COMMENTS)
            .into_entries()
            .iter()
            .map(|entry| {
                let item = entry.first_item();
                CommentData {
                    title: entry
                        .title
                        .clone()
                        .or_else(|| map_text(entry, "Media Owner"))
                        .unwrap_or_default(),
                    comment: item
                        .and_then(|i| i.value.clone())
                        .or_else(|| map_text(entry, "Comment"))
                        .unwrap_or_default(),
                    timestamp: item
                        .and_then(|i| i.timestamp)
                        .or_else(|| map_time(entry, "Time"))
                        .unwrap_or(0),
                }
            })
            .collect();

        let story_likes = self
            .read_optional::<raw::StoryLikesExport>(paths::STORY_LIKES)
            .story_activities_story_likes
            .iter()
            .map(|entry| StoryLikeData {
                title: entry.title(),
                timestamp: entry.first_item().and_then(|i| i.timestamp).unwrap_or(0),
            })
            .collect();

        let saved = self
            .read_optional::<raw::SavedExport>(paths::SAVED)
            .saved_saved_media
            .iter()
            .map(|entry| {
                let saved_on = entry.map_value("Saved on");
                SavedData {
                    title: entry.title(),
                    href: saved_on.and_then(|v| v.href.clone()).unwrap_or_default(),
                    timestamp: saved_on.and_then(|v| v.timestamp).unwrap_or(0),
                }
            })
            .collect();

        let engagement = EngagementData {
            likes,
            comments,
            story_likes,
            saved,
        };
        info!(
            likes = engagement.likes.len(),
            comments = engagement.comments.len(),
            story_likes = engagement.story_likes.len(),
            saved = engagement.saved.len(),
            "Parsed engagement"
        );
        engagement
    }

    /// Parse profile and keyword search history.
    pub fn parse_search_data(&self) -> SearchData {
        let profile_searches = self
            .read_optional::<raw::ProfileSearchesExport>(paths::PROFILE_SEARCHES)
            .searches_user
            .iter()
            .map(|entry| ProfileSearch {
                value: map_text(entry, "Search").unwrap_or_default(),
                search_time: map_time(entry, "Time").unwrap_or(0),
            })
            .collect();

        let word_searches = self
            .read_optional::<raw::WordSearchesExport>(paths::WORD_SEARCHES)
            .searches_keyword
            .iter()
            .map(|entry| WordSearch {
                value: map_text(entry, "Search").unwrap_or_default(),
                search_time: map_time(entry, "Time").unwrap_or(0),
            })
            .collect();

        let searches = SearchData {
            profile_searches,
            word_searches,
        };
        info!(
            profiles = searches.profile_searches.len(),
            keywords = searches.word_searches.len(),
            "Parsed search history"
        );
        searches
    }

    /// Parse the posts-viewed impressions history.
    pub fn parse_posts_viewed(&self) -> Vec<PostView> {
        let views: Vec<PostView> = self
            .read_optional::<raw::PostsViewedExport>(paths::POSTS_VIEWED)
            .impressions_history_posts_seen
            .iter()
            .map(|entry| PostView {
                author: map_text(entry, "Author").unwrap_or_default(),
                timestamp: map_time(entry, "Time").unwrap_or(0),
            })
            .collect();
        info!("Parsed {} viewed posts", views.len());
        views
    }
}

fn map_text(entry: &Entry, key: &str) -> Option<String> {
    entry.map_value(key).and_then(|v| v.value.clone())
}

fn map_time(entry: &Entry, key: &str) -> Option<i64> {
    entry.map_value(key).and_then(|v| v.timestamp)
}

fn is_message_fragment(file_name: &str) -> bool {
    file_name.starts_with("message_") && file_name.ends_with(".json")
}

/// Sort key placing `message_2.json` before `message_10.json`.
fn fragment_order(path: &str) -> (u32, String) {
    let file = path.rsplit('/').next().unwrap_or(path);
    let number = file
        .strip_prefix("message_")
        .and_then(|rest| rest.strip_suffix(".json"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX);
    (number, path.to_string())
}

/// Combine the fragments of one conversation.
///
/// Participants come from the last fragment that lists them. Messages are
/// stable-sorted ascending by timestamp, and exact duplicates sharing a
/// timestamp are collapsed to their first occurrence.
#[must_use]
pub fn merge_fragments(id: String, fragments: Vec<raw::ConversationFragment>) -> Conversation {
    let mut participants: Vec<Participant> = Vec::new();
    let mut messages: Vec<Message> = Vec::new();

    for fragment in fragments {
        if let Some(listed) = fragment.participants {
            participants = listed;
        }
        messages.extend(fragment.messages);
    }

    messages.sort_by_key(|m| m.timestamp_ms);
    let before = messages.len();
    let messages = collapse_duplicates(messages);
    if messages.len() < before {
        debug!(
            conversation = %id,
            removed = before - messages.len(),
            "Collapsed duplicate messages"
        );
    }

    Conversation {
        id,
        participants,
        messages,
    }
}

/// Drop messages equal to one already kept at the same timestamp.
///
/// Expects input sorted by timestamp; order is otherwise preserved.
fn collapse_duplicates(sorted: Vec<Message>) -> Vec<Message> {
    let mut kept: Vec<Message> = Vec::with_capacity(sorted.len());
    let mut run_start = 0;
    for message in sorted {
        if kept
            .last()
            .is_some_and(|last| last.timestamp_ms != message.timestamp_ms)
        {
            run_start = kept.len();
        }
        if !kept[run_start..].contains(&message) {
            kept.push(message);
        }
    }
    kept
}

/// Flatten `string_list_data` of relationship entries into follower records.
///
/// Newer exports move the handle out of `value` into the entry title, so the
/// title is used when `value` is absent.
fn flatten_relationships(entries: &[Entry]) -> Vec<FollowerData> {
    entries
        .iter()
        .flat_map(|entry| {
            entry.string_list_data.iter().map(move |item| FollowerData {
                username: item
                    .value
                    .clone()
                    .or_else(|| entry.title.clone())
                    .unwrap_or_default(),
                timestamp: item.timestamp.unwrap_or(0),
                href: item.href.clone().unwrap_or_default(),
            })
        })
        .collect()
}

/// Handle encoded in an individual conversation's directory name.
///
/// `john_doe_123456` yields `john_doe`. Names that do not follow the
/// `<handle>_<digits>` pattern, and purely numeric handles, yield "".
#[must_use]
pub fn extract_username(conversation_id: &str) -> String {
    CONVERSATION_ID
        .captures(conversation_id)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|handle| !handle.chars().all(|c| c.is_ascii_digit()))
        .map(String::from)
        .unwrap_or_default()
}

/// Build the listing summary for every conversation.
///
/// Conversations in which only the owner takes part are skipped.
#[must_use]
pub fn participant_statuses(
    conversations: &BTreeMap<String, Conversation>,
    owner: &str,
) -> Vec<ParticipantStatus> {
    conversations
        .iter()
        .filter_map(|(id, conversation)| {
            let others: Vec<String> = conversation
                .other_participants(owner)
                .map(String::from)
                .collect();
            if others.is_empty() {
                return None;
            }

            let last_message_time = conversation.last_message().map_or(0, |m| m.timestamp_ms);
            let message_count = conversation.messages.len();

            Some(if others.len() > 1 {
                ParticipantStatus {
                    conversation_id: id.clone(),
                    name: others.join(", "),
                    username: String::new(),
                    message_count,
                    last_message_time,
                    is_group_chat: true,
                    participant_count: others.len(),
                    participant_names: others,
                }
            } else {
                ParticipantStatus {
                    conversation_id: id.clone(),
                    name: others[0].clone(),
                    username: extract_username(id),
                    message_count,
                    last_message_time,
                    is_group_chat: false,
                    participant_count: 1,
                    participant_names: others,
                }
            })
        })
        .collect()
}

/// Guess the export owner: the name present in the most conversations.
///
/// Ties go to the name seen first when walking conversations in id order.
#[must_use]
pub fn detect_owner_name(conversations: &BTreeMap<String, Conversation>) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for conversation in conversations.values() {
        let mut seen_here: Vec<&str> = Vec::new();
        for participant in &conversation.participants {
            let name = participant.name.as_str();
            if name.is_empty() || seen_here.contains(&name) {
                continue;
            }
            seen_here.push(name);
            let count = counts.entry(name).or_insert_with(|| {
                order.push(name);
                0
            });
            *count += 1;
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for name in order {
        let count = counts[name];
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::DirectoryArchive;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, path: &str, content: &str) {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    fn inbox(conversation: &str, file: &str) -> String {
        format!("{INBOX_PREFIX}{conversation}/{file}")
    }

    #[test]
    fn test_extract_username() {
        assert_eq!(extract_username("john_doe_123456"), "john_doe");
        assert_eq!(extract_username("alice_42"), "alice");
        assert_eq!(extract_username("0_123456"), "");
        assert_eq!(extract_username("weekendcrew"), "");
        assert_eq!(extract_username("_123"), "");
    }

    #[test]
    fn test_is_message_fragment() {
        assert!(is_message_fragment("message_1.json"));
        assert!(is_message_fragment("message_12.json"));
        assert!(!is_message_fragment("photos/message_1.json"));
        assert!(!is_message_fragment("audio/1.mp4"));
        assert!(!is_message_fragment("message_1.txt"));
    }

    #[test]
    fn test_fragment_order_is_numeric() {
        let mut files = vec![
            "x/message_10.json".to_string(),
            "x/message_2.json".to_string(),
            "x/message_1.json".to_string(),
        ];
        files.sort_by_key(|p| fragment_order(p));
        assert_eq!(
            files,
            vec!["x/message_1.json", "x/message_2.json", "x/message_10.json"]
        );
    }

    #[test]
    fn test_merge_sorts_and_collapses_duplicates() {
        let newest_first = raw::ConversationFragment {
            participants: Some(vec![Participant {
                name: "Alice".into(),
            }]),
            messages: vec![Message::text("Alice", 300, "c"), Message::text("Alice", 200, "b")],
        };
        let overlap = raw::ConversationFragment {
            participants: None,
            messages: vec![
                Message::text("Alice", 200, "b"),
                Message::text("Bob", 200, "b2"),
                Message::text("Alice", 100, "a"),
            ],
        };

        let conv = merge_fragments("alice_1".into(), vec![newest_first, overlap]);
        let times: Vec<i64> = conv.messages.iter().map(|m| m.timestamp_ms).collect();
        assert_eq!(times, vec![100, 200, 200, 300]);
        // Same timestamp, different content survives
        assert!(conv.messages.iter().any(|m| m.content.as_deref() == Some("b2")));
        assert_eq!(conv.participants.len(), 1);
    }

    #[test]
    fn test_merge_collapses_repeated_fragment() {
        let fragment = || raw::ConversationFragment {
            participants: None,
            messages: vec![Message::text("Me", 100, "hey"), Message::text("Bob", 100, "yo")],
        };

        let conv = merge_fragments("bob_1".into(), vec![fragment(), fragment()]);
        let contents: Vec<&str> = conv
            .messages
            .iter()
            .filter_map(|m| m.content.as_deref())
            .collect();
        assert_eq!(contents, vec!["hey", "yo"]);
    }

    #[test]
    fn test_merge_keeps_repeats_at_other_timestamps() {
        let fragment = raw::ConversationFragment {
            participants: None,
            messages: vec![
                Message::text("Me", 100, "ok"),
                Message::text("Bob", 100, "yo"),
                Message::text("Me", 200, "ok"),
                Message::text("Me", 100, "ok"),
            ],
        };

        let conv = merge_fragments("bob_1".into(), vec![fragment]);
        let times: Vec<i64> = conv.messages.iter().map(|m| m.timestamp_ms).collect();
        assert_eq!(times, vec![100, 100, 200]);
        assert_eq!(conv.messages[1].sender, "Bob");
    }

    #[test]
    fn test_parse_conversations_repairs_and_orders() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            &inbox("alice_123", "message_1.json"),
            r#"{"participants":[{"name":"Alice"},{"name":"Me"}],
                "messages":[{"sender_name":"Alice","timestamp_ms":2000,"content":"cafÃ©"}]}"#,
        );
        write(
            &dir,
            &inbox("alice_123", "message_2.json"),
            r#"{"messages":[{"sender_name":"Me","timestamp_ms":1000,"content":"hi"}]}"#,
        );
        write(&dir, &inbox("alice_123", "photos/1.jpg"), "binary");

        let reader = DirectoryArchive::new(dir.path()).unwrap();
        let conversations = ArchiveParser::new(&reader).parse_conversations().unwrap();
        let conv = &conversations["alice_123"];
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].timestamp_ms, 1000);
        assert_eq!(conv.messages[1].content.as_deref(), Some("café"));
        assert_eq!(conv.participants.len(), 2);
    }

    #[test]
    fn test_malformed_fragment_fails_conversations() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            &inbox("bob_1", "message_1.json"),
            r#"{"participants":[{"name":"Bob"}],"messages":[{"sender_name":"Bob","timestamp_ms":1,"content":"ok"}]}"#,
        );
        write(&dir, &inbox("bob_1", "message_2.json"), "{ not json");

        let reader = DirectoryArchive::new(dir.path()).unwrap();
        let err = ArchiveParser::new(&reader).parse_conversations().unwrap_err();
        match err {
            IgxError::ParseError { file, .. } => assert!(file.ends_with("bob_1/message_2.json")),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_inbox_is_not_found() {
        let dir = TempDir::new().unwrap();
        write(&dir, paths::FOLLOWING, r#"{"relationships_following":[]}"#);
        let reader = DirectoryArchive::new(dir.path()).unwrap();
        let err = ArchiveParser::new(&reader).parse_conversations().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_followers_and_following_shapes() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            paths::FOLLOWERS,
            r#"[{"string_list_data":[{"href":"https://www.instagram.com/alice","value":"alice","timestamp":1700000000}]},
                {"string_list_data":[{"href":"https://www.instagram.com/bob","value":"bob","timestamp":1700000001}]}]"#,
        );
        write(
            &dir,
            paths::FOLLOWING,
            r#"{"relationships_following":[
                {"string_list_data":[{"href":"https://www.instagram.com/alice","value":"alice","timestamp":1}]},
                {"title":"carol","string_list_data":[{"href":"https://www.instagram.com/_u/carol","timestamp":2}]}]}"#,
        );

        let reader = DirectoryArchive::new(dir.path()).unwrap();
        let parser = ArchiveParser::new(&reader);
        let followers = parser.parse_followers().unwrap();
        assert_eq!(followers.len(), 2);
        assert_eq!(followers[0].username, "alice");
        assert_eq!(followers[1].timestamp, 1_700_000_001);

        let following = parser.parse_following().unwrap();
        assert_eq!(following[1].username, "carol");
    }

    #[test]
    fn test_malformed_followers_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, paths::FOLLOWERS, r#"{"oops": true"#);
        let reader = DirectoryArchive::new(dir.path()).unwrap();
        let err = ArchiveParser::new(&reader).parse_followers().unwrap_err();
        assert!(matches!(err, IgxError::ParseError { .. }));
    }

    #[test]
    fn test_optional_categories_degrade_independently() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            paths::LIKES,
            r#"{"likes_media_likes":[{"title":"alice","string_list_data":[{"href":"https://www.instagram.com/p/1","timestamp":10}]}]}"#,
        );
        write(&dir, paths::COMMENTS, "garbage");
        write(
            &dir,
            paths::SAVED,
            r#"{"saved_saved_media":[{"title":"bob","string_map_data":{"Saved on":{"href":"https://www.instagram.com/p/2","timestamp":20}}}]}"#,
        );

        let reader = DirectoryArchive::new(dir.path()).unwrap();
        let engagement = ArchiveParser::new(&reader).parse_engagement();
        assert_eq!(engagement.likes.len(), 1);
        assert_eq!(engagement.likes[0].href, "https://www.instagram.com/p/1");
        assert!(engagement.comments.is_empty());
        assert!(engagement.story_likes.is_empty());
        assert_eq!(engagement.saved[0].timestamp, 20);
    }

    #[test]
    fn test_comments_string_map_layout() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            paths::COMMENTS,
            r#"[{"string_map_data":{"Comment":{"value":"nice"},"Media Owner":{"value":"dana"},"Time":{"timestamp":5}}}]"#,
        );
        let reader = DirectoryArchive::new(dir.path()).unwrap();
        let engagement = ArchiveParser::new(&reader).parse_engagement();
        assert_eq!(engagement.comments[0].comment, "nice");
        assert_eq!(engagement.comments[0].title, "dana");
        assert_eq!(engagement.comments[0].timestamp, 5);
    }

    #[test]
    fn test_search_and_posts_viewed() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            paths::PROFILE_SEARCHES,
            r#"{"searches_user":[{"string_map_data":{"Search":{"value":"alice"},"Time":{"timestamp":100}}}]}"#,
        );
        write(
            &dir,
            paths::POSTS_VIEWED,
            r#"{"impressions_history_posts_seen":[{"string_map_data":{"Author":{"value":"natgeo"},"Time":{"timestamp":7}}}]}"#,
        );
        let reader = DirectoryArchive::new(dir.path()).unwrap();
        let parser = ArchiveParser::new(&reader);

        let searches = parser.parse_search_data();
        assert_eq!(searches.profile_searches[0].value, "alice");
        assert_eq!(searches.profile_searches[0].search_time, 100);
        assert!(searches.word_searches.is_empty());

        let views = parser.parse_posts_viewed();
        assert_eq!(views, vec![PostView { author: "natgeo".into(), timestamp: 7 }]);
    }

    fn conv(id: &str, names: &[&str], messages: Vec<Message>) -> (String, Conversation) {
        (
            id.to_string(),
            Conversation {
                id: id.to_string(),
                participants: names
                    .iter()
                    .map(|n| Participant {
                        name: (*n).to_string(),
                    })
                    .collect(),
                messages,
            },
        )
    }

    #[test]
    fn test_participant_statuses() {
        let conversations: BTreeMap<_, _> = [
            conv(
                "alice_123",
                &["Alice", "Me"],
                vec![Message::text("Alice", 5, "hi"), Message::text("Me", 9, "yo")],
            ),
            conv("crew_999", &["Alice", "Bob", "Me"], vec![]),
            conv("me_only_1", &["Me"], vec![]),
            conv("0_55", &["Zed", "Me"], vec![]),
        ]
        .into_iter()
        .collect();

        let statuses = participant_statuses(&conversations, "Me");
        assert_eq!(statuses.len(), 3);

        let alice = statuses.iter().find(|s| s.conversation_id == "alice_123").unwrap();
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.message_count, 2);
        assert_eq!(alice.last_message_time, 9);
        assert!(!alice.is_group_chat);

        let crew = statuses.iter().find(|s| s.conversation_id == "crew_999").unwrap();
        assert!(crew.is_group_chat);
        assert_eq!(crew.name, "Alice, Bob");
        assert_eq!(crew.username, "");
        assert_eq!(crew.participant_count, 2);
        assert_eq!(crew.last_message_time, 0);

        let zed = statuses.iter().find(|s| s.conversation_id == "0_55").unwrap();
        assert_eq!(zed.username, "");
    }

    #[test]
    fn test_detect_owner_name() {
        let conversations: BTreeMap<_, _> = [
            conv("a_1", &["Alice", "Me"], vec![]),
            conv("b_2", &["Bob", "Me"], vec![]),
            conv("c_3", &["Bob", "Carol", "Me"], vec![]),
        ]
        .into_iter()
        .collect();
        assert_eq!(detect_owner_name(&conversations).as_deref(), Some("Me"));
        assert_eq!(detect_owner_name(&BTreeMap::new()), None);
    }

    #[test]
    fn test_detect_owner_tie_goes_to_first_seen() {
        let conversations: BTreeMap<_, _> = [conv("a_1", &["Alice", "Me"], vec![])]
            .into_iter()
            .collect();
        assert_eq!(detect_owner_name(&conversations).as_deref(), Some("Alice"));
    }
}
