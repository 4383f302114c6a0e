//! # Caller identity
//!
//! Reads `Authorization: Bearer <token>` and resolves it through the
//! configured `SessionResolver`.

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use rf_core::error::AppError;
use rf_core::traits::SessionResolver;
use uuid::Uuid;

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The authenticated user, or `None` for anonymous or invalid credentials.
pub async fn resolve_caller(req: &HttpRequest, sessions: &dyn SessionResolver) -> Option<Uuid> {
    let token = bearer_token(req)?;
    sessions.resolve(token).await
}

/// Like [`resolve_caller`] but anonymous callers are rejected.
pub async fn require_caller(req: &HttpRequest, sessions: &dyn SessionResolver) -> Result<Uuid, AppError> {
    resolve_caller(req, sessions)
        .await
        .ok_or_else(|| AppError::Unauthorized("a valid session token is required".to_string()))
}
