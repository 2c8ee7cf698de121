//! User CRUD REST microservice.
//!
//! A thin three-layer service over a single `User` resource stored in PostgreSQL:
//!
//! ```text
//! HTTP (axum) ──► handler ──► UserService ──► UserRepository ──► PostgreSQL
//!                                                 └──► in-memory mock (tests)
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`user`]: User model, repository, service and HTTP handlers
//! - [`health`]: Database liveness checks
//! - [`mask`]: Masking of sensitive values before logging
//! - [`api`]: Router, health/metrics endpoints and request logging
//! - [`app`]: Dependency wiring
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod health;
pub mod mask;
pub mod metrics;
pub mod user;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};
