//! # rf-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rf-core` domain models. One `SqliteForumRepo` backs every
//! repository port.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rf_core::models::{CommentRecord, TargetType, TopicMention, Vote, VoteKey};
use rf_core::traits::{CommentPort, NotificationPort, TargetPort, TopicPort, VotePort};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// Idempotent schema, applied on every start.
///
/// `votes` is keyed by its natural key so the store itself guarantees one
/// row per (user, target).
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id          BLOB PRIMARY KEY,
        author_id   BLOB NOT NULL,
        title       TEXT NOT NULL,
        score       INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id          BLOB PRIMARY KEY,
        post_id     BLOB NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        parent_id   BLOB,
        author_id   BLOB NOT NULL,
        body        TEXT NOT NULL,
        score       INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id)",
    "CREATE TABLE IF NOT EXISTS votes (
        user_id     BLOB NOT NULL,
        target_type TEXT NOT NULL CHECK (target_type IN ('post', 'comment')),
        target_id   BLOB NOT NULL,
        direction   TEXT NOT NULL CHECK (direction IN ('up', 'down')),
        created_at  TEXT NOT NULL,
        PRIMARY KEY (user_id, target_type, target_id)
    )",
    // Aggregate scores follow the vote rows inside the writing statement, so
    // a failed write leaves neither the row nor the score changed.
    "CREATE TRIGGER IF NOT EXISTS votes_score_insert AFTER INSERT ON votes
    BEGIN
        UPDATE posts SET score = score + (CASE NEW.direction WHEN 'up' THEN 1 ELSE -1 END)
            WHERE NEW.target_type = 'post' AND id = NEW.target_id;
        UPDATE comments SET score = score + (CASE NEW.direction WHEN 'up' THEN 1 ELSE -1 END)
            WHERE NEW.target_type = 'comment' AND id = NEW.target_id;
    END",
    "CREATE TRIGGER IF NOT EXISTS votes_score_update AFTER UPDATE OF direction ON votes
    BEGIN
        UPDATE posts SET score = score
                + (CASE NEW.direction WHEN 'up' THEN 1 ELSE -1 END)
                - (CASE OLD.direction WHEN 'up' THEN 1 ELSE -1 END)
            WHERE NEW.target_type = 'post' AND id = NEW.target_id;
        UPDATE comments SET score = score
                + (CASE NEW.direction WHEN 'up' THEN 1 ELSE -1 END)
                - (CASE OLD.direction WHEN 'up' THEN 1 ELSE -1 END)
            WHERE NEW.target_type = 'comment' AND id = NEW.target_id;
    END",
    "CREATE TRIGGER IF NOT EXISTS votes_score_delete AFTER DELETE ON votes
    BEGIN
        UPDATE posts SET score = score - (CASE OLD.direction WHEN 'up' THEN 1 ELSE -1 END)
            WHERE OLD.target_type = 'post' AND id = OLD.target_id;
        UPDATE comments SET score = score - (CASE OLD.direction WHEN 'up' THEN 1 ELSE -1 END)
            WHERE OLD.target_type = 'comment' AND id = OLD.target_id;
    END",
    "CREATE TABLE IF NOT EXISTS topics (
        id          BLOB PRIMARY KEY,
        label       TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS topic_mentions (
        topic_id     BLOB NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
        mentioned_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_topic_mentions_at ON topic_mentions (mentioned_at)",
    "CREATE TABLE IF NOT EXISTS notifications (
        id          BLOB PRIMARY KEY,
        user_id     BLOB NOT NULL,
        kind        TEXT NOT NULL,
        read        INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_notifications_unread ON notifications (user_id, read)",
];

pub struct SqliteForumRepo {
    pool: SqlitePool,
}

impl SqliteForumRepo {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, 5).await
    }

    /// Opens the pool and applies the schema.
    ///
    /// In-memory databases live and die with their connection, so they get a
    /// single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        let repo = Self { pool };
        repo.migrate().await?;
        log::info!("SQLite store ready at {url}");
        Ok(repo)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // Seeding helpers used by fixtures and tests.

    pub async fn insert_post(&self, id: Uuid, author_id: Uuid, title: &str, created_at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO posts (id, author_id, title, created_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(author_id)
            .bind(title)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_comment(&self, comment: &CommentRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, parent_id, author_id, body, score, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.parent_id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .bind(comment.score)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_topic(&self, id: Uuid, label: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO topics (id, label) VALUES (?, ?)")
            .bind(id)
            .bind(label)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_mention(&self, topic_id: Uuid, mentioned_at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO topic_mentions (topic_id, mentioned_at) VALUES (?, ?)")
            .bind(topic_id)
            .bind(mentioned_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Creates an unread notification and returns its id.
    pub async fn insert_notification(&self, user_id: Uuid, kind: &str) -> anyhow::Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO notifications (id, user_id, kind, read, created_at) VALUES (?, ?, ?, 0, ?)")
            .bind(id)
            .bind(user_id)
            .bind(kind)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn table_for(target_type: TargetType) -> &'static str {
    match target_type {
        TargetType::Post => "posts",
        TargetType::Comment => "comments",
    }
}

fn vote_from_row(row: &SqliteRow) -> anyhow::Result<Vote> {
    Ok(Vote {
        user_id: row.try_get("user_id")?,
        target_type: row.try_get::<String, _>("target_type")?.parse()?,
        target_id: row.try_get("target_id")?,
        direction: row.try_get::<String, _>("direction")?.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> anyhow::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        parent_id: row.try_get("parent_id")?,
        author_id: row.try_get("author_id")?,
        body: row.try_get("body")?,
        score: row.try_get("score")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl VotePort for SqliteForumRepo {
    async fn find(&self, key: &VoteKey) -> anyhow::Result<Option<Vote>> {
        let row = sqlx::query(
            "SELECT user_id, target_type, target_id, direction, created_at
             FROM votes WHERE user_id = ? AND target_type = ? AND target_id = ?",
        )
        .bind(key.user_id)
        .bind(key.target_type.as_str())
        .bind(key.target_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(vote_from_row).transpose()
    }

    /// Atomic insert-or-update on the natural key.
    async fn upsert(&self, vote: &Vote) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO votes (user_id, target_type, target_id, direction, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id, target_type, target_id)
             DO UPDATE SET direction = excluded.direction",
        )
        .bind(vote.user_id)
        .bind(vote.target_type.as_str())
        .bind(vote.target_id)
        .bind(vote.direction.as_str())
        .bind(vote.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &VoteKey) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM votes WHERE user_id = ? AND target_type = ? AND target_id = ?")
            .bind(key.user_id)
            .bind(key.target_type.as_str())
            .bind(key.target_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TargetPort for SqliteForumRepo {
    async fn exists(&self, target_type: TargetType, target_id: Uuid) -> anyhow::Result<bool> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = ?)", table_for(target_type));
        let found: i64 = sqlx::query_scalar(&sql)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found != 0)
    }
}

#[async_trait]
impl TopicPort for SqliteForumRepo {
    async fn list_mentions_since(&self, cutoff: DateTime<Utc>) -> anyhow::Result<Vec<TopicMention>> {
        let rows = sqlx::query(
            "SELECT m.topic_id, t.label, m.mentioned_at
             FROM topic_mentions m
             JOIN topics t ON t.id = m.topic_id
             WHERE m.mentioned_at >= ?",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> anyhow::Result<TopicMention> {
                Ok(TopicMention {
                    topic_id: row.try_get("topic_id")?,
                    label: row.try_get("label")?,
                    mentioned_at: row.try_get("mentioned_at")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl NotificationPort for SqliteForumRepo {
    async fn count_unread(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CommentPort for SqliteForumRepo {
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Option<Vec<CommentRecord>>> {
        if !self.exists(TargetType::Post, post_id).await? {
            return Ok(None);
        }

        let rows = sqlx::query(
            "SELECT id, post_id, parent_id, author_id, body, score, created_at
             FROM comments WHERE post_id = ?",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        let comments = rows.iter().map(comment_from_row).collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Some(comments))
    }
}
