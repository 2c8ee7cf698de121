//! Liveness checks against the service's dependencies.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

/// Status string reported for a healthy dependency.
pub const UP: &str = "UP";

/// Status string reported for a failing dependency.
pub const DOWN: &str = "DOWN";

/// A single dependency probe.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Name under which the result is reported.
    fn name(&self) -> &str;

    /// Probe the dependency; `Err` carries the failure text.
    async fn check(&self) -> Result<(), String>;
}

/// Pings a PostgreSQL pool with `SELECT 1`.
#[derive(Debug, Clone)]
pub struct SqlHealthChecker {
    pool: PgPool,
    timeout: Duration,
}

impl SqlHealthChecker {
    /// Create a checker over a pool with the given probe timeout.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl HealthChecker for SqlHealthChecker {
    fn name(&self) -> &str {
        "sql"
    }

    async fn check(&self) -> Result<(), String> {
        let probe = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(self.timeout, probe).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {}ms", self.timeout.as_millis())),
        }
    }
}

/// Result of one checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// `UP` or `DOWN`.
    pub status: &'static str,
    /// Failure text when down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `UP` when every checker passed.
    pub status: &'static str,
    /// Per-checker results.
    pub details: BTreeMap<String, CheckResult>,
}

impl HealthReport {
    /// Whether every checker passed.
    pub fn is_up(&self) -> bool {
        self.status == UP
    }
}

/// Run every checker and aggregate the results.
pub async fn check_all(checkers: &[Arc<dyn HealthChecker>]) -> HealthReport {
    let mut details = BTreeMap::new();
    let mut status = UP;

    for checker in checkers {
        let result = match checker.check().await {
            Ok(()) => CheckResult {
                status: UP,
                error: None,
            },
            Err(e) => {
                warn!(checker = checker.name(), error = %e, "Health check failed");
                status = DOWN;
                CheckResult {
                    status: DOWN,
                    error: Some(e),
                }
            }
        };
        details.insert(checker.name().to_string(), result);
    }

    HealthReport { status, details }
}
