//! Data models for Instagram export data.
//!
//! The first half of this module holds the normalized records handed to
//! callers. The second half (`raw` shapes) mirrors the JSON layout of each
//! export file so that every category is validated and defaulted on its own.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Milliseconds since the Unix epoch (message timestamps).
pub type TimestampMs = i64;

/// Seconds since the Unix epoch (follow, engagement and search records).
pub type TimestampSecs = i64;

// =============================================================================
// Messages and conversations
// =============================================================================

/// A photo, video or audio attachment on a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub creation_timestamp: TimestampSecs,
}

/// An emoji reaction left on a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(default)]
    pub reaction: String,
    #[serde(default)]
    pub actor: String,
}

/// A shared link payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_text: Option<String>,
}

/// A direct message. Field names follow the export so that a conversation
/// serialized back to JSON looks like the file it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "sender_name", default)]
    pub sender: String,
    #[serde(default)]
    pub timestamp_ms: TimestampMs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_files: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<Share>,
}

impl Message {
    /// Convenience constructor for a plain text message.
    pub fn text(
        sender: impl Into<String>,
        timestamp_ms: TimestampMs,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            timestamp_ms,
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Content with surrounding whitespace removed, `None` when blank.
    #[must_use]
    pub fn trimmed_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A conversation participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub name: String,
}

/// A message thread, keyed by its inbox directory name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participants: Vec<Participant>,
    /// Sorted ascending by timestamp.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Participants other than the export owner.
    pub fn other_participants<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a str> {
        self.participants
            .iter()
            .map(|p| p.name.as_str())
            .filter(move |name| *name != owner)
    }

    /// More than one participant remains once the owner is excluded.
    #[must_use]
    pub fn is_group(&self, owner: &str) -> bool {
        self.other_participants(owner).nth(1).is_some()
    }

    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Derived per-conversation summary used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantStatus {
    pub conversation_id: String,
    /// Display name, or the other names joined with ", " for groups.
    pub name: String,
    /// Handle recovered from the directory name; empty when unknown.
    pub username: String,
    pub message_count: usize,
    pub last_message_time: TimestampMs,
    pub is_group_chat: bool,
    pub participant_count: usize,
    pub participant_names: Vec<String>,
}

// =============================================================================
// Connections
// =============================================================================

/// One follower or following entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerData {
    pub username: String,
    pub timestamp: TimestampSecs,
    pub href: String,
}

// =============================================================================
// Engagement
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeData {
    pub title: String,
    pub href: String,
    pub timestamp: TimestampSecs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentData {
    pub title: String,
    pub comment: String,
    pub timestamp: TimestampSecs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryLikeData {
    pub title: String,
    pub timestamp: TimestampSecs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedData {
    pub title: String,
    pub href: String,
    pub timestamp: TimestampSecs,
}

/// All engagement categories. Each one is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementData {
    pub likes: Vec<LikeData>,
    pub comments: Vec<CommentData>,
    pub story_likes: Vec<StoryLikeData>,
    pub saved: Vec<SavedData>,
}

impl EngagementData {
    #[must_use]
    pub fn total(&self) -> usize {
        self.likes.len() + self.comments.len() + self.story_likes.len() + self.saved.len()
    }
}

// =============================================================================
// Searches and impressions
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSearch {
    pub value: String,
    pub search_time: TimestampSecs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSearch {
    pub value: String,
    pub search_time: TimestampSecs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchData {
    pub profile_searches: Vec<ProfileSearch>,
    pub word_searches: Vec<WordSearch>,
}

/// A post shown in the feed, from the ads impressions history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub author: String,
    pub timestamp: TimestampSecs,
}

// =============================================================================
// Raw export shapes
// =============================================================================

/// Layout of the JSON files inside the export, one type per file.
pub mod raw {
    use super::{HashMap, Deserialize, Message, Participant, TimestampSecs};

    /// One `message_N.json` fragment.
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct ConversationFragment {
        #[serde(default)]
        pub participants: Option<Vec<Participant>>,
        #[serde(default)]
        pub messages: Vec<Message>,
    }

    /// `{href, value, timestamp}` as found in `string_list_data`.
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct StringListItem {
        #[serde(default)]
        pub href: Option<String>,
        #[serde(default)]
        pub value: Option<String>,
        #[serde(default)]
        pub timestamp: Option<TimestampSecs>,
    }

    /// A value inside `string_map_data`.
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct StringMapValue {
        #[serde(default)]
        pub href: Option<String>,
        #[serde(default)]
        pub value: Option<String>,
        #[serde(default)]
        pub timestamp: Option<TimestampSecs>,
    }

    /// The record shape shared by nearly every non-message export file.
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct Entry {
        #[serde(default)]
        pub title: Option<String>,
        #[serde(default)]
        pub string_list_data: Vec<StringListItem>,
        #[serde(default)]
        pub string_map_data: HashMap<String, StringMapValue>,
    }

    impl Entry {
        pub fn first_item(&self) -> Option<&StringListItem> {
            self.string_list_data.first()
        }

        pub fn map_value(&self, key: &str) -> Option<&StringMapValue> {
            self.string_map_data.get(key)
        }

        pub fn title(&self) -> String {
            self.title.clone().unwrap_or_default()
        }
    }

    /// `followers_1.json` is a bare array of entries.
    pub type FollowersExport = Vec<Entry>;

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct FollowingExport {
        #[serde(default)]
        pub relationships_following: Vec<Entry>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct LikesExport {
        #[serde(default)]
        pub likes_media_likes: Vec<Entry>,
    }

    /// Comments have shipped both wrapped and as a bare array.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(untagged)]
    pub enum CommentsExport {
        Wrapped {
            #[serde(default)]
            comments_media_comments: Vec<Entry>,
        },
        Bare(Vec<Entry>),
    }

    impl Default for CommentsExport {
        fn default() -> Self {
            Self::Bare(Vec::new())
        }
    }

    impl CommentsExport {
        pub fn into_entries(self) -> Vec<Entry> {
            match self {
                Self::Wrapped {
                    comments_media_comments,
                } => comments_media_comments,
                Self::Bare(entries) => entries,
            }
        }
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct StoryLikesExport {
        #[serde(default)]
        pub story_activities_story_likes: Vec<Entry>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct SavedExport {
        #[serde(default)]
        pub saved_saved_media: Vec<Entry>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct ProfileSearchesExport {
        #[serde(default)]
        pub searches_user: Vec<Entry>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct WordSearchesExport {
        #[serde(default)]
        pub searches_keyword: Vec<Entry>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct PostsViewedExport {
        #[serde(default)]
        pub impressions_history_posts_seen: Vec<Entry>,
    }
}
