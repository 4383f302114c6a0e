//! # rf-api
//!
//! The web routing and orchestration layer for Rusty-Forum.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod middleware;

use actix_web::web;
use rf_core::error::AppError;

use crate::error::ApiError;

/// Configures the routes for the forum API.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Malformed bodies and query strings answer in the same JSON shape as
    // every other client error.
    let json_config = web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| ApiError(AppError::ValidationError(err.to_string())).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| ApiError(AppError::ValidationError(err.to_string())).into());

    cfg.app_data(json_config).app_data(query_config).service(
        web::scope("")
            .route("/health", web::get().to(handlers::health))
            .route("/votes", web::post().to(handlers::cast_vote))
            .route("/topics/trending", web::get().to(handlers::trending_topics))
            .route("/notifications/unread-count", web::get().to(handlers::unread_count))
            .route("/posts/{post_id}/comments", web::get().to(handlers::post_comments)),
    );
}
