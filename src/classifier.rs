//! Separates human-written messages from system notices.
//!
//! Instagram stores reactions, call events, shares and group changes as
//! ordinary messages with canned text. Every statistic in the crate filters
//! through [`is_meaningful`] so that counts stay consistent with each other.

use crate::model::Message;
use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($re).expect("valid regex"));
    };
}

pattern!(ATTACHMENT, r"(?i)sent an attachment\.$");
pattern!(REACTION, r"^Reacted .+ to your message\s*$");
pattern!(REACTION_PREFIX, r"^Reacted .+ to your message");
pattern!(LIKED_MESSAGE, r"(?i)liked a message$");
pattern!(MEDIA_SHARE, r"shared a (story|post|reel|profile)\.$");
pattern!(GROUP_CHANGE, r"(added|removed|named the group|changed the group photo)");
pattern!(CALL, r"(started a call|joined the call|ended the call)");
pattern!(
    AUDIO_CALL,
    r"(started an audio call|missed an audio call|Audio call ended)"
);
pattern!(OWN_AUDIO_CALL, r"You (started an audio call|missed an audio call)");
pattern!(UNAVAILABLE, r"^This message is no longer available$");
pattern!(STORY_REPLY, r"replied to your story");
pattern!(MENTION, r"mentioned you");

/// What kind of message a piece of content is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Human-authored text.
    Text,
    /// No content, or only whitespace.
    Empty,
    Attachment,
    Reaction,
    Like,
    MediaShare,
    GroupChange,
    Call,
    AudioCall,
    Unavailable,
    StoryReply,
    Mention,
}

impl MessageKind {
    /// Classify trimmed message content.
    #[must_use]
    pub fn of_content(content: Option<&str>) -> Self {
        let Some(content) = content.map(str::trim).filter(|c| !c.is_empty()) else {
            return Self::Empty;
        };

        if ATTACHMENT.is_match(content) {
            Self::Attachment
        } else if REACTION.is_match(content) {
            Self::Reaction
        } else if LIKED_MESSAGE.is_match(content) {
            Self::Like
        } else if MEDIA_SHARE.is_match(content) {
            Self::MediaShare
        } else if GROUP_CHANGE.is_match(content) {
            Self::GroupChange
        } else if CALL.is_match(content) {
            Self::Call
        } else if AUDIO_CALL.is_match(content) || OWN_AUDIO_CALL.is_match(content) {
            Self::AudioCall
        } else if UNAVAILABLE.is_match(content) {
            Self::Unavailable
        } else if STORY_REPLY.is_match(content) {
            Self::StoryReply
        } else if MENTION.is_match(content) {
            Self::Mention
        } else {
            Self::Text
        }
    }

    #[must_use]
    pub fn of(message: &Message) -> Self {
        Self::of_content(message.content.as_deref())
    }

    #[must_use]
    pub const fn is_meaningful(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// Whether a message carries human-written content.
///
/// Note that the group-change markers match anywhere in the text, so a
/// sentence such as "I added salt" is also treated as a notice.
#[must_use]
pub fn is_meaningful(message: &Message) -> bool {
    MessageKind::of(message).is_meaningful()
}

/// Meaningful messages of a slice, in their original order.
pub fn meaningful_messages(messages: &[Message]) -> impl Iterator<Item = &Message> {
    messages.iter().filter(|m| is_meaningful(m))
}

// Counters below look at the raw (untrimmed) content, matching how the
// per-category tallies in `MessageStats` are defined.

pub(crate) fn is_attachment_notice(content: &str) -> bool {
    ATTACHMENT.is_match(content)
}

pub(crate) fn is_reaction_notice(content: &str) -> bool {
    REACTION_PREFIX.is_match(content)
}

pub(crate) fn is_like_notice(content: &str) -> bool {
    LIKED_MESSAGE.is_match(content)
}

pub(crate) fn is_share_notice(content: &str) -> bool {
    MEDIA_SHARE.is_match(content)
}

pub(crate) fn is_audio_call_notice(content: &str) -> bool {
    AUDIO_CALL.is_match(content) || OWN_AUDIO_CALL.is_match(content)
}
