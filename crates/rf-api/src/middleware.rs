//! rusty-forum/crates/rf-api/src/middleware.rs Middleware
//!
//! Standard middleware for logging, security headers and CORS.

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderValue};
use actix_web::middleware::{DefaultHeaders, Logger};

/// Access log: remote-ip "request-line" status-code response-size "referrer" "user-agent" duration
pub fn standard_middleware() -> Logger {
    Logger::new(r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %Dms"#)
}

pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")))
        .add((header::REFERRER_POLICY, HeaderValue::from_static("strict-origin-when-cross-origin")))
        .add((header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")))
}

// The web client may be served from a different origin than the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600)
}
