//! HTTP API module: router, health/metrics endpoints and request logging.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::{AppState, RequestLogConfig};
pub use routes::create_router;
