//! Unified error types for the user service.

use thiserror::Error;

/// Unified error type for the user service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Database connection or migration error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Metrics recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by a [`UserRepository`](crate::user::UserRepository).
///
/// The handler layer reports these verbatim as the body of a 500 response.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Error returned by the SQL driver, unchanged.
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    /// Backend unavailable (used by the in-memory repository).
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
