//! Loaded export state and the accessors analytics are served from.
//!
//! A [`Dataset`] is built in one pass over an [`ArchiveReader`] and never
//! mutated afterwards. [`AnalysisSession`] holds the currently visible
//! dataset and swaps it only after a new load has fully succeeded.

use crate::archive::{ArchiveReader, INBOX_PREFIX};
use crate::connections::RelationshipSets;
use crate::error::{IgxError, Result};
use crate::logging::OperationGuard;
use crate::model::{Conversation, EngagementData, FollowerData, ParticipantStatus, PostView, SearchData};
use crate::parser::{ArchiveParser, detect_owner_name, participant_statuses};
use crate::sentiment::{ConversationSentiment, SentimentScorer};
use crate::stats_analytics::{ConversationMomentum, MessageStats, ResponseTimeAnalysis};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Whose export this is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerIdentity {
    /// Display name exactly as it appears in message participants.
    Named(String),
    /// Guess from participant frequency at load time.
    Inferred,
}

/// Why a required section of a loaded export is unavailable.
///
/// Kept inside the dataset so the failure surfaces from the affected
/// accessor only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("Missing required file in archive: {file}")]
    Missing { file: String },

    #[error("Failed to parse '{file}': {reason}")]
    Malformed { file: String, reason: String },
}

impl SectionError {
    fn capture(error: IgxError, file: &str) -> Self {
        match error {
            IgxError::MissingArchiveFile { file } => Self::Missing { file },
            IgxError::ParseError { file, reason } => Self::Malformed { file, reason },
            other => Self::Malformed {
                file: file.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<SectionError> for IgxError {
    fn from(error: SectionError) -> Self {
        match error {
            SectionError::Missing { file } => Self::MissingArchiveFile { file },
            SectionError::Malformed { file, reason } => Self::ParseError { file, reason },
        }
    }
}

type Section<T> = std::result::Result<T, SectionError>;

fn section<T>(result: Result<T>, file: &str) -> Section<T> {
    result.map_err(|e| SectionError::capture(e, file))
}

/// Everything recovered from one export.
#[derive(Debug)]
pub struct Dataset {
    owner_name: String,
    conversations: Section<BTreeMap<String, Conversation>>,
    followers: Section<Vec<FollowerData>>,
    following: Section<Vec<FollowerData>>,
    engagement: EngagementData,
    search: SearchData,
    posts_viewed: Vec<PostView>,
}

impl Dataset {
    /// Parse every category of the export.
    ///
    /// Missing or malformed required files are recorded per section. Loading
    /// fails only when none of the required sections could be read, or when
    /// the owner has to be inferred and no participants exist.
    ///
    /// # Errors
    /// Returns [`IgxError::InvalidArchive`] or [`IgxError::OwnerUnknown`].
    pub fn load(reader: &dyn ArchiveReader, owner: &OwnerIdentity) -> Result<Self> {
        let parser = ArchiveParser::new(reader);

        let (conversations, ((followers, following), (engagement, (search, posts_viewed)))) =
            rayon::join(
                || section(parser.parse_conversations(), INBOX_PREFIX),
                || {
                    rayon::join(
                        || {
                            rayon::join(
                                || {
                                    section(
                                        parser.parse_followers(),
                                        crate::archive::paths::FOLLOWERS,
                                    )
                                },
                                || {
                                    section(
                                        parser.parse_following(),
                                        crate::archive::paths::FOLLOWING,
                                    )
                                },
                            )
                        },
                        || {
                            rayon::join(
                                || parser.parse_engagement(),
                                || {
                                    rayon::join(
                                        || parser.parse_search_data(),
                                        || parser.parse_posts_viewed(),
                                    )
                                },
                            )
                        },
                    )
                },
            );

        if conversations.is_err() && followers.is_err() && following.is_err() {
            return Err(IgxError::invalid_archive(format!(
                "{} contains no messages, followers or following data",
                reader.describe()
            )));
        }

        let owner_name = match owner {
            OwnerIdentity::Named(name) => name.clone(),
            OwnerIdentity::Inferred => {
                let detected = conversations.as_ref().ok().and_then(detect_owner_name);
                let Some(name) = detected else {
                    return Err(IgxError::OwnerUnknown {
                        reason: "no conversation participants to infer from".to_string(),
                    });
                };
                warn!(owner = %name, "Owner name inferred from participant frequency");
                name
            }
        };

        Ok(Self {
            owner_name,
            conversations,
            followers,
            following,
            engagement,
            search,
            posts_viewed,
        })
    }

    /// Name excluded from participant counts.
    #[must_use]
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// All conversations keyed by id, messages sorted ascending.
    ///
    /// # Errors
    /// Fails when the inbox was missing or unreadable.
    pub fn conversations(&self) -> Result<&BTreeMap<String, Conversation>> {
        self.conversations.as_ref().map_err(|e| e.clone().into())
    }

    /// # Errors
    /// [`IgxError::NotFound`] for an unknown id, or the inbox failure.
    pub fn conversation(&self, id: &str) -> Result<&Conversation> {
        self.conversations()?
            .get(id)
            .ok_or_else(|| IgxError::not_found("Conversation", id))
    }

    /// One listing record per conversation, in id order.
    ///
    /// # Errors
    /// Fails when the inbox was missing or unreadable.
    pub fn participant_statuses(&self) -> Result<Vec<ParticipantStatus>> {
        Ok(participant_statuses(self.conversations()?, &self.owner_name))
    }

    /// # Errors
    /// Fails when the followers file was missing or malformed.
    pub fn followers(&self) -> Result<&[FollowerData]> {
        self.followers
            .as_deref()
            .map_err(|e| e.clone().into())
    }

    /// # Errors
    /// Fails when the following file was missing or malformed.
    pub fn following(&self) -> Result<&[FollowerData]> {
        self.following
            .as_deref()
            .map_err(|e| e.clone().into())
    }

    /// # Errors
    /// Fails when either connection list is unavailable.
    pub fn relationships(&self) -> Result<RelationshipSets> {
        Ok(RelationshipSets::compute(self.followers()?, self.following()?))
    }

    #[must_use]
    pub const fn engagement(&self) -> &EngagementData {
        &self.engagement
    }

    #[must_use]
    pub const fn search_data(&self) -> &SearchData {
        &self.search
    }

    #[must_use]
    pub fn posts_viewed(&self) -> &[PostView] {
        &self.posts_viewed
    }

    /// # Errors
    /// [`IgxError::NotFound`] for an unknown id.
    pub fn message_stats(&self, id: &str) -> Result<MessageStats> {
        Ok(MessageStats::compute(&self.conversation(id)?.messages))
    }

    /// # Errors
    /// [`IgxError::NotFound`] for an unknown id.
    pub fn response_time_analysis(&self, id: &str) -> Result<ResponseTimeAnalysis> {
        Ok(ResponseTimeAnalysis::compute(&self.conversation(id)?.messages))
    }

    /// # Errors
    /// [`IgxError::NotFound`] for an unknown id.
    pub fn momentum(&self, id: &str) -> Result<ConversationMomentum> {
        Ok(ConversationMomentum::compute(&self.conversation(id)?.messages))
    }

    /// Computed fresh on every call.
    ///
    /// # Errors
    /// [`IgxError::NotFound`] for an unknown id.
    pub fn sentiment_summary(
        &self,
        id: &str,
        scorer: &dyn SentimentScorer,
    ) -> Result<ConversationSentiment> {
        Ok(ConversationSentiment::analyze(
            &self.conversation(id)?.messages,
            scorer,
        ))
    }
}

/// Holds the dataset readers currently see.
pub struct AnalysisSession {
    owner: OwnerIdentity,
    current: RwLock<Option<Arc<Dataset>>>,
}

impl AnalysisSession {
    #[must_use]
    pub const fn new(owner: OwnerIdentity) -> Self {
        Self {
            owner,
            current: RwLock::new(None),
        }
    }

    /// Build a fresh dataset and make it visible.
    ///
    /// On failure the previously visible dataset, if any, is left in place.
    ///
    /// # Errors
    /// Propagates [`Dataset::load`] failures.
    pub fn load(&self, reader: &dyn ArchiveReader) -> Result<Arc<Dataset>> {
        let guard = OperationGuard::new(format!("load {}", reader.describe()));
        match Dataset::load(reader, &self.owner) {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                *self.current.write() = Some(Arc::clone(&dataset));
                info!(
                    conversations = dataset.conversations.as_ref().map_or(0, BTreeMap::len),
                    followers = dataset.followers.as_ref().map_or(0, Vec::len),
                    following = dataset.following.as_ref().map_or(0, Vec::len),
                    engagement = dataset.engagement.total(),
                    "Archive loaded"
                );
                guard.complete();
                Ok(dataset)
            }
            Err(e) => {
                guard.fail(&e);
                Err(e)
            }
        }
    }

    /// # Errors
    /// [`IgxError::NoDataLoaded`] before the first successful load.
    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        self.current.read().clone().ok_or(IgxError::NoDataLoaded)
    }

    /// Forget the visible dataset.
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    #[must_use]
    pub const fn owner(&self) -> &OwnerIdentity {
        &self.owner
    }
}
