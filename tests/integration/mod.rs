//! Integration tests against a real PostgreSQL database.
//!
//! These tests require a DATABASE_URL environment variable.
//! Run with: cargo test --test integration -- --ignored
//!
//! Note: every test works on its own ids and cleans up after itself.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use user_service::api::create_router;
use user_service::app::{build_state, connect};
use user_service::config::Config;
use user_service::health::{HealthChecker, SqlHealthChecker};
use user_service::user::adapter::CONFLICT;
use user_service::user::{SqlUserAdapter, User, UserPatch, UserRepository};

/// Get a test config from environment.
fn test_config() -> Option<Config> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    let mut config = Config::with_database_url(url);
    config.auto_migrate = true;
    config.db_max_connections = 2;
    Some(config)
}

async fn adapter() -> Option<SqlUserAdapter> {
    let config = test_config()?;
    let pool = connect(&config).await.expect("database connection failed");
    let adapter = SqlUserAdapter::new(pool);
    adapter.ensure_schema().await.expect("schema creation failed");
    Some(adapter)
}

fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: Some(format!("name-{id}")),
        email: Some(format!("{id}@example.com")),
        phone: Some("0987654321".to_string()),
        date_of_birth: Some(Utc.with_ymd_and_hms(1990, 1, 2, 3, 4, 5).unwrap()),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_load_round_trip() {
    let Some(repo) = adapter().await else {
        println!("Skipping: DATABASE_URL not set");
        return;
    };
    let u = user("it-roundtrip");
    repo.delete(&u.id).await.unwrap();

    assert_eq!(repo.create(&u).await.unwrap(), 1);
    assert_eq!(repo.load(&u.id).await.unwrap(), Some(u.clone()));
    assert!(repo.all().await.unwrap().contains(&u));

    assert_eq!(repo.delete(&u.id).await.unwrap(), 1);
    assert_eq!(repo.load(&u.id).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_id_reports_zero() {
    let Some(repo) = adapter().await else {
        return;
    };
    let u = user("it-duplicate");
    repo.delete(&u.id).await.unwrap();

    assert_eq!(repo.create(&u).await.unwrap(), 1);
    assert_eq!(repo.create(&u).await.unwrap(), 0);

    repo.delete(&u.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unique_email_violation_is_conflict() {
    let Some(repo) = adapter().await else {
        return;
    };
    let a = user("it-email-a");
    let mut b = user("it-email-b");
    repo.delete(&a.id).await.unwrap();
    repo.delete(&b.id).await.unwrap();

    repo.create(&a).await.unwrap();
    repo.create(&b).await.unwrap();

    b.email = a.email.clone();
    assert_eq!(repo.update(&b).await.unwrap(), CONFLICT);

    repo.delete(&a.id).await.unwrap();
    repo.delete(&b.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_patch_updates_only_given_columns() {
    let Some(repo) = adapter().await else {
        return;
    };
    let u = user("it-patch");
    repo.delete(&u.id).await.unwrap();
    repo.create(&u).await.unwrap();

    let body = br#"{"phone":null,"dateOfBirth":"2001-02-03T04:05:06Z"}"#;
    let (decoded, present) = UserPatch::decode(body).unwrap();
    let mut patch = UserPatch::from_body(&decoded, &present);
    patch.id = u.id.clone();

    assert_eq!(repo.patch(&patch).await.unwrap(), 1);

    let stored = repo.load(&u.id).await.unwrap().unwrap();
    assert_eq!(stored.username, u.username);
    assert_eq!(stored.phone, None);
    assert_eq!(
        stored.date_of_birth,
        Some(Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).unwrap())
    );

    patch.id = "it-patch-missing".to_string();
    assert_eq!(repo.patch(&patch).await.unwrap(), 0);

    repo.delete(&u.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_health_probe() {
    let Some(config) = test_config() else {
        return;
    };
    let pool = connect(&config).await.unwrap();
    let checker = SqlHealthChecker::new(pool, Duration::from_secs(4));

    assert_eq!(checker.check().await, Ok(()));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_http_crud_flow() {
    let Some(config) = test_config() else {
        return;
    };
    let pool = connect(&config).await.unwrap();
    let state = build_state(&config, pool, None).await.unwrap();
    let app = create_router(state);

    let call = |method: &'static str, uri: &'static str, body: Option<&'static str>| {
        let app = app.clone();
        async move {
            let body = body.map(Body::from).unwrap_or_else(Body::empty);
            let response = app
                .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }
    };

    call("DELETE", "/users/it-http", None).await;

    let (status, _) = call("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call("POST", "/users", Some(r#"{"id":"it-http","username":"ada"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call("POST", "/users", Some(r#"{"id":"it-http","username":"ada"}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, text) = call("PATCH", "/users/it-http", Some(r#"{"email":"ada@x.io"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, r#"{"email":"ada@x.io"}"#);

    let (status, text) = call("GET", "/users/it-http", None).await;
    assert_eq!(status, StatusCode::OK);
    let loaded: User = serde_json::from_str(&text).unwrap();
    assert_eq!(loaded.email.as_deref(), Some("ada@x.io"));

    let (status, _) = call("DELETE", "/users/it-http", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call("GET", "/users/it-http", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
