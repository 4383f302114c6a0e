//! # VoteLedger
//!
//! Decides what a vote action does to the stored vote row and how much the
//! target's aggregate score moves. Every action lands in one of three
//! branches:
//!
//! | existing vote      | effect          | outcome     | score delta |
//! |--------------------|-----------------|-------------|-------------|
//! | none               | insert          | requested   | ±1          |
//! | same direction     | delete (toggle) | `none`      | ∓1          |
//! | opposite direction | switch          | requested   | ±2          |
//!
//! The store applies the delta to the aggregate together with the row
//! write (see [`TargetPort`]), so the ledger only reports it.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{OutcomeDirection, TargetType, Vote, VoteDirection, VoteKey, VoteOutcome};
use crate::traits::{TargetPort, VotePort};

pub struct VoteLedger {
    votes: Arc<dyn VotePort>,
    targets: Arc<dyn TargetPort>,
}

impl VoteLedger {
    pub fn new(votes: Arc<dyn VotePort>, targets: Arc<dyn TargetPort>) -> Self {
        Self { votes, targets }
    }

    /// Records `direction` from `user_id` on the target and returns the
    /// resulting standing plus the exact score change.
    ///
    /// The caller is expected to have authenticated `user_id`; a nil id is
    /// rejected before the port is touched. Votes on a post or comment that
    /// does not exist fail with `NotFound` and write nothing.
    pub async fn cast_vote(
        &self,
        user_id: Uuid,
        target_type: TargetType,
        target_id: Uuid,
        direction: VoteDirection,
    ) -> Result<VoteOutcome> {
        if user_id.is_nil() {
            return Err(AppError::validation("acting user id must not be empty"));
        }

        self.ensure_target(target_type, target_id).await?;

        let key = VoteKey {
            user_id,
            target_type,
            target_id,
        };

        let existing = self.votes.find(&key).await.map_err(AppError::from_port)?;

        match existing {
            None => {
                let vote = Vote {
                    user_id,
                    target_type,
                    target_id,
                    direction,
                    created_at: Utc::now(),
                };
                self.votes.upsert(&vote).await.map_err(AppError::from_port)?;
                Ok(VoteOutcome {
                    direction: direction.into(),
                    score_delta: direction.weight(),
                })
            }
            Some(prior) if prior.direction == direction => {
                self.votes.delete(&key).await.map_err(AppError::from_port)?;
                Ok(VoteOutcome {
                    direction: OutcomeDirection::Cleared,
                    score_delta: -prior.direction.weight(),
                })
            }
            Some(prior) => {
                let switched = Vote { direction, ..prior };
                self.votes.upsert(&switched).await.map_err(AppError::from_port)?;
                Ok(VoteOutcome {
                    direction: direction.into(),
                    score_delta: direction.weight() - prior.direction.weight(),
                })
            }
        }
    }

    async fn ensure_target(&self, target_type: TargetType, target_id: Uuid) -> Result<()> {
        let exists = self
            .targets
            .exists(target_type, target_id)
            .await
            .map_err(AppError::from_port)?;
        if exists {
            return Ok(());
        }
        let kind = match target_type {
            TargetType::Post => "Post",
            TargetType::Comment => "Comment",
        };
        Err(AppError::NotFound(kind.to_string(), target_id.to_string()))
    }
}
