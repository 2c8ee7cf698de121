//! HTTP handlers for the `/users` resource.
//!
//! Successful responses carry JSON; failures carry the error message as plain
//! text. Request bodies are read once as raw bytes and decoded here, so a
//! malformed body surfaces as a 500 with the decoder's message.

use std::cmp::Ordering;
use std::fmt::Display;

use axum::body::Bytes;
use axum::extract::{FromRef, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::model::{User, UserPatch};
use super::service::UserService;

/// Message returned when the path id is missing.
pub const EMPTY_ID: &str = "Id cannot be empty";

/// Message returned when the body id differs from the path id.
pub const ID_MISMATCH: &str = "Id not match";

/// Message returned when a patch body names no known field.
pub const EMPTY_PATCH: &str = "No fields to patch";

/// Routes for the user resource.
///
/// `/users/` (trailing slash) reaches the id handlers with an empty id.
pub fn routes<S>() -> Router<S>
where
    UserService: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/users", get(all).post(create))
        .route(
            "/users/",
            get(load).put(update).patch(patch).delete(delete),
        )
        .route(
            "/users/:id",
            get(load).put(update).patch(patch).delete(delete),
        )
}

/// GET /users
pub async fn all(State(service): State<UserService>) -> Response {
    match service.all().await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => internal_error("all", e),
    }
}

/// GET /users/:id
pub async fn load(
    State(service): State<UserService>,
    path: Option<Path<String>>,
) -> Response {
    let id = path_id(path);
    if id.is_empty() {
        return bad_request(EMPTY_ID);
    }

    match service.load(&id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(Value::Null)).into_response(),
        Err(e) => internal_error("load", e),
    }
}

/// POST /users
pub async fn create(State(service): State<UserService>, body: Bytes) -> Response {
    let mut user: User = match serde_json::from_slice(&body) {
        Ok(user) => user,
        Err(e) => return decode_error(e),
    };

    if user.id.is_empty() {
        user.id = Uuid::new_v4().to_string();
        debug!(id = %user.id, "Assigned user id");
    }

    match service.create(&user).await {
        Ok(n) if n > 0 => {
            info!(id = %user.id, "User created");
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Ok(n) => (StatusCode::CONFLICT, Json(n)).into_response(),
        Err(e) => internal_error("create", e),
    }
}

/// PUT /users/:id
pub async fn update(
    State(service): State<UserService>,
    path: Option<Path<String>>,
    body: Bytes,
) -> Response {
    let mut user: User = match serde_json::from_slice(&body) {
        Ok(user) => user,
        Err(e) => return decode_error(e),
    };

    let id = path_id(path);
    if id.is_empty() {
        return bad_request(EMPTY_ID);
    }
    if let Err(response) = adopt_id(&mut user.id, &id) {
        return response;
    }

    match service.update(&user).await {
        Ok(n) => write_result(n, &user),
        Err(e) => internal_error("update", e),
    }
}

/// PATCH /users/:id
pub async fn patch(
    State(service): State<UserService>,
    path: Option<Path<String>>,
    body: Bytes,
) -> Response {
    let id = path_id(path);
    if id.is_empty() {
        return bad_request(EMPTY_ID);
    }

    let (mut user, present) = match UserPatch::decode(&body) {
        Ok(decoded) => decoded,
        Err(e) => return decode_error(e),
    };
    if let Err(response) = adopt_id(&mut user.id, &id) {
        return response;
    }

    let patch = UserPatch::from_body(&user, &present);
    if patch.is_empty() {
        return bad_request(EMPTY_PATCH);
    }

    match service.patch(&patch).await {
        Ok(n) => write_result(n, &patch),
        Err(e) => internal_error("patch", e),
    }
}

/// DELETE /users/:id
pub async fn delete(
    State(service): State<UserService>,
    path: Option<Path<String>>,
) -> Response {
    let id = path_id(path);
    if id.is_empty() {
        return bad_request(EMPTY_ID);
    }

    match service.delete(&id).await {
        Ok(n) if n > 0 => {
            info!(id = %id, "User deleted");
            (StatusCode::OK, Json(n)).into_response()
        }
        Ok(n) => (StatusCode::NOT_FOUND, Json(n)).into_response(),
        Err(e) => internal_error("delete", e),
    }
}

fn path_id(path: Option<Path<String>>) -> String {
    path.map(|Path(id)| id).unwrap_or_default()
}

/// Fill an empty body id from the path, or reject a mismatch.
fn adopt_id(body_id: &mut String, path_id: &str) -> Result<(), Response> {
    if body_id.is_empty() {
        *body_id = path_id.to_string();
        Ok(())
    } else if body_id != path_id {
        Err(bad_request(ID_MISMATCH))
    } else {
        Ok(())
    }
}

/// Map an update/patch affected count to a response.
fn write_result<T: Serialize>(affected: i64, body: &T) -> Response {
    match affected.cmp(&0) {
        Ordering::Greater => (StatusCode::OK, Json(body)).into_response(),
        Ordering::Equal => (StatusCode::NOT_FOUND, Json(affected)).into_response(),
        Ordering::Less => (StatusCode::CONFLICT, Json(affected)).into_response(),
    }
}

fn bad_request(message: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

fn decode_error(e: impl Display) -> Response {
    debug!(error = %e, "Failed to decode request body");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

fn internal_error(operation: &'static str, e: impl Display) -> Response {
    error!(operation, error = %e, "User operation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}
