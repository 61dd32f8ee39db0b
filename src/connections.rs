//! Follower / following set arithmetic.

use crate::model::FollowerData;
use serde::Serialize;
use std::collections::HashSet;

/// The three-way split of an account's connections.
///
/// Membership is decided by exact, case-sensitive handle equality. Records
/// keep the order of the list they were taken from; `mutual` is taken from
/// the follower list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationshipSets {
    pub mutual: Vec<FollowerData>,
    pub followers_only: Vec<FollowerData>,
    pub following_only: Vec<FollowerData>,
    /// `|following| / |followers|`, 0 when there are no followers.
    pub follow_ratio: f64,
}

impl RelationshipSets {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(followers: &[FollowerData], following: &[FollowerData]) -> Self {
        let follower_handles: HashSet<&str> =
            followers.iter().map(|f| f.username.as_str()).collect();
        let following_handles: HashSet<&str> =
            following.iter().map(|f| f.username.as_str()).collect();

        let (mutual, followers_only) = followers
            .iter()
            .cloned()
            .partition(|f| following_handles.contains(f.username.as_str()));
        let following_only = following
            .iter()
            .filter(|f| !follower_handles.contains(f.username.as_str()))
            .cloned()
            .collect();

        let follow_ratio = if followers.is_empty() {
            0.0
        } else {
            following.len() as f64 / followers.len() as f64
        };

        Self {
            mutual,
            followers_only,
            following_only,
            follow_ratio,
        }
    }

    /// Ratio rendered with two decimals.
    #[must_use]
    pub fn follow_ratio_display(&self) -> String {
        format!("{:.2}", self.follow_ratio)
    }
}
