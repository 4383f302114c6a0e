//! # rf-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core
//! services. Handlers authenticate, bound their inputs, call exactly one core
//! operation and serialize its result.

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use rf_config::LimitsSettings;
use rf_core::models::{CommentNode, TargetType, TrendingTopic, VoteDirection, VoteKey};
use rf_core::traits::{CommentPort, NotificationPort, SessionResolver, TargetPort, TopicPort, VotePort};
use rf_core::{CommentThreadLoader, NotificationCounter, TrendingRanker, VoteLedger};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{require_caller, resolve_caller};
use crate::error::ApiError;
use crate::locks::VoteLocks;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub votes: VoteLedger,
    pub trending: TrendingRanker,
    pub notifications: NotificationCounter,
    pub comments: CommentThreadLoader,
    pub sessions: Box<dyn SessionResolver>,
    pub vote_locks: VoteLocks,
    pub limits: LimitsSettings,
}

impl AppState {
    /// Wires every core service to a single store implementing all ports.
    pub fn new<R>(repo: Arc<R>, sessions: Box<dyn SessionResolver>, limits: LimitsSettings) -> Self
    where
        R: VotePort + TargetPort + TopicPort + NotificationPort + CommentPort + 'static,
    {
        Self {
            votes: VoteLedger::new(repo.clone(), repo.clone()),
            trending: TrendingRanker::new(repo.clone()),
            notifications: NotificationCounter::new(repo.clone()),
            comments: CommentThreadLoader::new(repo),
            sessions,
            vote_locks: VoteLocks::new(),
            limits,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub target_type: String,
    pub target_id: Uuid,
    pub direction: String,
}

/// `POST /votes`
pub async fn cast_vote(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CastVoteRequest>,
) -> Result<HttpResponse, ApiError> {
    // 1. Identity
    let user_id = require_caller(&req, data.sessions.as_ref()).await?;

    // 2. Validation: unknown enum values never reach a port
    let CastVoteRequest {
        target_type,
        target_id,
        direction,
    } = body.into_inner();
    let target_type: TargetType = target_type.parse()?;
    let direction: VoteDirection = direction.parse()?;

    // 3. Ledger, serialized per (user, target). The store moves the
    //    aggregate score together with the vote row.
    let _guard = data
        .vote_locks
        .lock(VoteKey {
            user_id,
            target_type,
            target_id,
        })
        .await;
    let outcome = data.votes.cast_vote(user_id, target_type, target_id, direction).await?;

    log::debug!(
        "vote {direction} by {user_id} on {target_type} {target_id}: delta {}",
        outcome.score_delta
    );

    Ok(HttpResponse::Ok().json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<usize>,
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub topics: Vec<TrendingTopic>,
}

/// `GET /topics/trending?limit=&days=`
pub async fn trending_topics(
    data: web::Data<AppState>,
    query: web::Query<TrendingQuery>,
) -> Result<HttpResponse, ApiError> {
    let limits = &data.limits;
    let limit = query
        .limit
        .unwrap_or(limits.trending_default_limit)
        .min(limits.trending_max_limit);
    let days = query
        .days
        .unwrap_or(limits.trending_default_days)
        .min(limits.trending_max_days);

    let topics = data.trending.rank_trending_topics(limit, days).await?;
    Ok(HttpResponse::Ok().json(TrendingResponse { topics }))
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// `GET /notifications/unread-count`. Anonymous callers get zero, never 401.
pub async fn unread_count(data: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let user_id = resolve_caller(&req, data.sessions.as_ref()).await;
    let count = data.notifications.unread_count(user_id).await?;
    Ok(HttpResponse::Ok().json(UnreadCountResponse { count }))
}

#[derive(Debug, Serialize)]
pub struct CommentThreadResponse {
    pub comments: Vec<CommentNode>,
}

/// `GET /posts/{post_id}/comments`
pub async fn post_comments(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let comments = data
        .comments
        .load_thread(post_id, data.limits.comment_max_depth)
        .await?;
    Ok(HttpResponse::Ok().json(CommentThreadResponse { comments }))
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
