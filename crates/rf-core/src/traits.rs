//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Every method returns `anyhow::Result`; the core turns failures into
//! `AppError` (see [`crate::error::AppError::from_port`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{CommentRecord, TargetType, TopicMention, Vote, VoteKey};

/// Persistence contract for vote rows.
///
/// Implementations must keep at most one row per [`VoteKey`]: `upsert`
/// inserts or replaces, never blindly appends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VotePort: Send + Sync {
    async fn find(&self, key: &VoteKey) -> anyhow::Result<Option<Vote>>;
    async fn upsert(&self, vote: &Vote) -> anyhow::Result<()>;
    async fn delete(&self, key: &VoteKey) -> anyhow::Result<()>;
}

/// The posts and comments votes are cast on.
///
/// Stores keep each target's aggregate score in step with its vote rows, in
/// the same unit as the row write: a vote row never changes without its
/// score delta being applied.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TargetPort: Send + Sync {
    async fn exists(&self, target_type: TargetType, target_id: Uuid) -> anyhow::Result<bool>;
}

/// Read access to topic mentions for trending.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TopicPort: Send + Sync {
    /// Every mention with `mentioned_at >= cutoff`, in a single read.
    async fn list_mentions_since(&self, cutoff: DateTime<Utc>) -> anyhow::Result<Vec<TopicMention>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Number of `read = false` notification rows addressed to the user.
    async fn count_unread(&self, user_id: Uuid) -> anyhow::Result<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentPort: Send + Sync {
    /// All comments on a post, flat and in no particular order.
    /// Returns `None` when the post itself does not exist.
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Option<Vec<CommentRecord>>>;
}

/// Identity contract used by the HTTP adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolves a bearer token to the user it was issued for.
    /// Unknown, expired or forged tokens yield `None`.
    async fn resolve(&self, token: &str) -> Option<Uuid>;
}
