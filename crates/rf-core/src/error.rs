//! # AppError
//!
//! Centralized error handling for the Rusty-Forum core.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all rf-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Post, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., unknown vote direction, zero limit)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Caller identity required but missing. Raised by adapters, never by
    /// the core operations themselves.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, cancelled port call)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Concurrent write detected by a store without atomic upsert
    #[error("conflict: {0}")]
    Conflict(String),
}

impl AppError {
    /// Converts a port failure into a core error.
    ///
    /// A port may raise a typed `AppError` itself (a store detecting a
    /// concurrent write reports `Conflict`); that error is passed through.
    /// Anything else becomes `Internal` with the full context chain.
    pub fn from_port(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::Internal(format!("{other:#}")),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }
}

/// A specialized Result type for Rusty-Forum logic.
pub type Result<T> = std::result::Result<T, AppError>;
