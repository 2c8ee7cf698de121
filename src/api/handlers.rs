//! HTTP API handlers and shared state.

use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::health::{check_all, HealthChecker};
use crate::user::UserService;

/// Request logging settings.
#[derive(Debug, Clone, Default)]
pub struct RequestLogConfig {
    /// Log masked JSON request and response bodies.
    pub log_body: bool,
    /// Largest body buffered for logging.
    pub body_limit: usize,
    /// Extra top-level fields to mask.
    pub mask_fields: Arc<Vec<String>>,
}

impl From<&Config> for RequestLogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_body: config.log_request_body,
            body_limit: config.log_body_limit,
            mask_fields: Arc::new(config.log_mask_fields.clone()),
        }
    }
}

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// User service.
    pub users: UserService,
    /// Dependency probes run by `/health`.
    pub checkers: Arc<[Arc<dyn HealthChecker>]>,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    /// Request logging settings.
    pub logging: RequestLogConfig,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        users: UserService,
        checkers: Vec<Arc<dyn HealthChecker>>,
        logging: RequestLogConfig,
    ) -> Self {
        Self {
            users,
            checkers: checkers.into(),
            metrics: None,
            logging,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

/// Health check handler - 200 when every dependency is up, 500 otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = check_all(&state.checkers).await;

    if report.is_up() {
        (StatusCode::OK, Json(report))
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(report))
    }
}

/// Metrics handler - Prometheus text format.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}
