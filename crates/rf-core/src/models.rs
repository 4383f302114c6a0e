//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Forum.
//! Identifiers are UUIDs; every timestamp is UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// What a vote applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Post => "post",
            TargetType::Comment => "comment",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(TargetType::Post),
            "comment" => Ok(TargetType::Comment),
            other => Err(AppError::validation(format!(
                "unknown target type '{other}', expected 'post' or 'comment'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }

    /// Contribution of a single vote in this direction to the target's score.
    pub fn weight(&self) -> i32 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(AppError::validation(format!(
                "unknown vote direction '{other}', expected 'up' or 'down'"
            ))),
        }
    }
}

/// Natural key of a vote row. At most one `Vote` exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteKey {
    pub user_id: Uuid,
    pub target_type: TargetType,
    pub target_id: Uuid,
}

/// A single user's vote on a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: Uuid,
    pub target_type: TargetType,
    pub target_id: Uuid,
    pub direction: VoteDirection,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn key(&self) -> VoteKey {
        VoteKey {
            user_id: self.user_id,
            target_type: self.target_type,
            target_id: self.target_id,
        }
    }
}

/// The user's standing on a target after a vote action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeDirection {
    Up,
    Down,
    /// The action removed a prior vote.
    #[serde(rename = "none")]
    Cleared,
}

impl From<VoteDirection> for OutcomeDirection {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => OutcomeDirection::Up,
            VoteDirection::Down => OutcomeDirection::Down,
        }
    }
}

/// Result of a vote action. `score_delta` is exactly what the target's
/// aggregate score must change by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub direction: OutcomeDirection,
    pub score_delta: i32,
}

/// One occurrence of a topic inside the trending window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMention {
    pub topic_id: Uuid,
    pub label: String,
    pub mentioned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingTopic {
    pub topic_id: Uuid,
    pub label: String,
    /// Sum of the time-decayed weights of every mention in the window.
    pub score: f64,
    pub mention_count: u64,
}

/// A comment row as stored: flat, with an optional parent pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub body: String,
    /// Aggregate vote score maintained by the store
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// A comment placed in a reply tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub comment: CommentRecord,
    pub depth: usize,
    pub replies: Vec<CommentNode>,
    /// Set on a node sitting at the depth limit whose `replies` hold its
    /// flattened descendants, so the presenter can link to a continuation view.
    pub continues_thread: bool,
}

impl CommentNode {
    pub fn leaf(comment: CommentRecord, depth: usize) -> Self {
        Self {
            comment,
            depth,
            replies: Vec::new(),
            continues_thread: false,
        }
    }
}
