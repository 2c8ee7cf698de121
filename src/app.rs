//! Dependency wiring: database pool → adapter → service → HTTP state.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::api::{AppState, RequestLogConfig};
use crate::config::Config;
use crate::error::Result;
use crate::health::{HealthChecker, SqlHealthChecker};
use crate::user::{SqlUserAdapter, UserService};

/// Open the PostgreSQL pool described by the configuration.
pub async fn connect(config: &Config) -> Result<PgPool> {
    info!(
        url = %config.redacted_database_url(),
        max_connections = config.db_max_connections,
        "Connecting to database"
    );
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Build the HTTP state over an open pool.
///
/// Creates the users table first when `AUTO_MIGRATE` is set.
pub async fn build_state(
    config: &Config,
    pool: PgPool,
    metrics: Option<PrometheusHandle>,
) -> Result<AppState> {
    let adapter = SqlUserAdapter::new(pool.clone());
    if config.auto_migrate {
        adapter.ensure_schema().await?;
    }

    let users = UserService::new(Arc::new(adapter));
    let checkers: Vec<Arc<dyn HealthChecker>> =
        vec![Arc::new(SqlHealthChecker::new(pool, config.health_timeout()))];

    Ok(AppState::new(users, checkers, RequestLogConfig::from(config)).with_metrics(metrics))
}
