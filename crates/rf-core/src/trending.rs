//! # TrendingRanker
//!
//! Ranks topics by recency-weighted popularity over a trailing window.
//! Each mention contributes `1 / (1 + age_in_days)`, so recent mentions
//! count close to 1 and the weight fades smoothly toward the window edge.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{TopicMention, TrendingTopic};
use crate::traits::TopicPort;

const SECONDS_PER_DAY: f64 = 86_400.0;

pub struct TrendingRanker {
    port: Arc<dyn TopicPort>,
}

impl TrendingRanker {
    pub fn new(port: Arc<dyn TopicPort>) -> Self {
        Self { port }
    }

    /// Top `limit` topics mentioned during the last `days_back` days.
    pub async fn rank_trending_topics(&self, limit: usize, days_back: u32) -> Result<Vec<TrendingTopic>> {
        self.rank_as_of(Utc::now(), limit, days_back).await
    }

    /// Ranking relative to a fixed `now`.
    pub async fn rank_as_of(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        days_back: u32,
    ) -> Result<Vec<TrendingTopic>> {
        if limit == 0 {
            return Err(AppError::validation("limit must be a positive integer"));
        }
        if days_back == 0 {
            return Err(AppError::validation("days must be a positive integer"));
        }

        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(days_back)))
            .ok_or_else(|| AppError::validation(format!("a {days_back}-day window is out of range")))?;

        let mentions = self
            .port
            .list_mentions_since(cutoff)
            .await
            .map_err(AppError::from_port)?;

        Ok(rank_mentions(&mentions, now, limit))
    }
}

/// Weight of one mention made `age` before the ranking instant.
/// Mentions stamped in the future are treated as brand new.
pub fn decay_weight(age: Duration) -> f64 {
    let days = (age.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY).max(0.0);
    1.0 / (1.0 + days)
}

/// Pure ranking step: group, score, order, truncate.
pub fn rank_mentions(mentions: &[TopicMention], now: DateTime<Utc>, limit: usize) -> Vec<TrendingTopic> {
    let mut by_topic: BTreeMap<Uuid, TrendingTopic> = BTreeMap::new();

    for mention in mentions {
        let entry = by_topic.entry(mention.topic_id).or_insert_with(|| TrendingTopic {
            topic_id: mention.topic_id,
            label: mention.label.clone(),
            score: 0.0,
            mention_count: 0,
        });
        entry.score += decay_weight(now - mention.mentioned_at);
        entry.mention_count += 1;
    }

    let mut ranked: Vec<TrendingTopic> = by_topic.into_values().collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.mention_count.cmp(&a.mention_count))
            .then_with(|| a.topic_id.cmp(&b.topic_id))
    });
    ranked.truncate(limit);
    ranked
}
