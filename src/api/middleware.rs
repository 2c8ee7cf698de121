//! Request logging with sensitive-field masking.

use std::time::Instant;

use axum::body::{to_bytes, Body, Bytes, HttpBody};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use serde_json::Value;
use tracing::{info, warn};

use crate::mask::mask_body;
use crate::metrics;

use super::handlers::RequestLogConfig;

/// Log every request with its status and duration, and (optionally) its masked
/// request and response bodies.
pub async fn log_request(
    State(config): State<RequestLogConfig>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let request = if config.log_body {
        match buffer_body(request, config.body_limit).await {
            Ok((request, bytes)) => {
                if let Some(body) = masked_body(&bytes, &config.mask_fields) {
                    info!(method = %method, path = %path, body = %body, "Request body");
                }
                request
            }
            Err(response) => return response,
        }
    } else {
        request
    };

    let mut response = next.run(request).await;
    let status = response.status().as_u16();

    if config.log_body {
        let (buffered, body) = masked_response(response, &config).await;
        if let Some(body) = body {
            info!(method = %method, path = %path, status, response = %body, "Response body");
        }
        response = buffered;
    }

    metrics::record_http_request(method.as_str(), status, start);
    info!(
        method = %method,
        path = %path,
        status,
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// Read the body into memory and rebuild the request around it.
async fn buffer_body(request: Request, limit: usize) -> Result<(Request, Bytes), Response> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, limit).await.map_err(|e| {
        let e = e.into_inner();
        warn!(error = %e, limit, "Failed to buffer request body");
        if e.downcast_ref::<LengthLimitError>().is_some() {
            (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response()
        } else {
            (StatusCode::BAD_REQUEST, "failed to read request body").into_response()
        }
    })?;

    let request = Request::from_parts(parts, Body::from(bytes.clone()));
    Ok((request, bytes))
}

/// Buffer a response body within the log limit and render it masked.
///
/// Bodies without a known size, or larger than the limit, pass through unlogged.
pub async fn masked_response(
    response: Response,
    config: &RequestLogConfig,
) -> (Response, Option<String>) {
    let fits = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|n| n <= config.body_limit as u64);
    if !fits {
        return (response, None);
    }

    let (parts, body) = response.into_parts();
    match to_bytes(body, config.body_limit).await {
        Ok(bytes) => {
            let masked = masked_body(&bytes, &config.mask_fields);
            (Response::from_parts(parts, Body::from(bytes)), masked)
        }
        Err(e) => {
            warn!(error = %e, "Failed to buffer response body");
            let response =
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to read response body").into_response();
            (response, None)
        }
    }
}

/// Masked rendering of a JSON object body; `None` for empty or non-object bodies.
pub fn masked_body(bytes: &[u8], mask_fields: &[String]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes).ok()? {
        Value::Object(mut map) => {
            mask_body(&mut map, mask_fields);
            Some(Value::Object(map).to_string())
        }
        _ => None,
    }
}
