//! PostgreSQL implementation of [`UserRepository`].

use async_trait::async_trait;
use sqlx::postgres::PgQueryResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::RepositoryError;
use crate::metrics::{self, LatencyTimer};

use super::model::{PatchValue, User, UserPatch, USER_TABLE};
use super::repository::UserRepository;

/// Affected count reported when a write hits a unique constraint.
pub const CONFLICT: i64 = -1;

const SELECT_ALL: &str =
    "SELECT id, username, email, phone, date_of_birth FROM users ORDER BY id";

const SELECT_ONE: &str =
    "SELECT id, username, email, phone, date_of_birth FROM users WHERE id = $1";

const INSERT: &str = r#"
    INSERT INTO users (id, username, email, phone, date_of_birth)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (id) DO NOTHING
"#;

const UPDATE: &str = r#"
    UPDATE users
    SET username = $2, email = $3, phone = $4, date_of_birth = $5
    WHERE id = $1
"#;

const DELETE: &str = "DELETE FROM users WHERE id = $1";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(40) PRIMARY KEY,
        username VARCHAR(100),
        email VARCHAR(100) UNIQUE,
        phone VARCHAR(18),
        date_of_birth TIMESTAMPTZ
    )
"#;

/// User repository backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct SqlUserAdapter {
    pool: PgPool,
}

impl SqlUserAdapter {
    /// Create an adapter over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!(table = USER_TABLE, "Schema ready");
        Ok(())
    }
}

/// Build `UPDATE users SET col = $n, ... WHERE id = $1`-style SQL for a patch.
pub fn build_patch_query(patch: &UserPatch) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE {USER_TABLE} SET "));

    for (i, (field, value)) in patch.changes.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(field.column).push(" = ");
        push_value(&mut builder, value);
        if let Some(cast) = field.kind.sql_cast() {
            builder.push("::").push(cast);
        }
    }

    builder.push(" WHERE id = ").push_bind(patch.id.clone());
    builder
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &PatchValue) {
    match value {
        PatchValue::Null => {
            builder.push_bind(None::<String>);
        }
        PatchValue::Bool(b) => {
            builder.push_bind(*b);
        }
        PatchValue::Number(n) => match n.as_i64() {
            Some(i) => {
                builder.push_bind(i);
            }
            None => {
                builder.push_bind(n.as_f64());
            }
        },
        PatchValue::Text(s) => {
            builder.push_bind(s.clone());
        }
    }
}

/// Map a write result to an affected count, reporting unique violations as [`CONFLICT`].
fn affected(
    operation: &'static str,
    result: Result<PgQueryResult, sqlx::Error>,
) -> Result<i64, RepositoryError> {
    match result {
        Ok(done) => Ok(i64::try_from(done.rows_affected()).unwrap_or(i64::MAX)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!(operation, constraint = ?e.constraint(), "Unique violation");
            Ok(CONFLICT)
        }
        Err(e) => {
            metrics::inc_db_errors(operation);
            Err(e.into())
        }
    }
}

fn failed(operation: &'static str, e: sqlx::Error) -> RepositoryError {
    metrics::inc_db_errors(operation);
    e.into()
}

#[async_trait]
impl UserRepository for SqlUserAdapter {
    async fn all(&self) -> Result<Vec<User>, RepositoryError> {
        let _timer = LatencyTimer::db_query("all");
        sqlx::query_as::<_, User>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| failed("all", e))
    }

    async fn load(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let _timer = LatencyTimer::db_query("load");
        sqlx::query_as::<_, User>(SELECT_ONE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| failed("load", e))
    }

    async fn create(&self, user: &User) -> Result<i64, RepositoryError> {
        let _timer = LatencyTimer::db_query("create");
        let result = sqlx::query(INSERT)
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(user.date_of_birth)
            .execute(&self.pool)
            .await;
        affected("create", result)
    }

    async fn update(&self, user: &User) -> Result<i64, RepositoryError> {
        let _timer = LatencyTimer::db_query("update");
        let result = sqlx::query(UPDATE)
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(user.date_of_birth)
            .execute(&self.pool)
            .await;
        affected("update", result)
    }

    async fn patch(&self, patch: &UserPatch) -> Result<i64, RepositoryError> {
        if patch.is_empty() {
            debug!(id = %patch.id, "Empty patch, nothing to update");
            return Ok(0);
        }

        let _timer = LatencyTimer::db_query("patch");
        let mut query = build_patch_query(patch);
        let result = query.build().execute(&self.pool).await;
        affected("patch", result)
    }

    async fn delete(&self, id: &str) -> Result<i64, RepositoryError> {
        let _timer = LatencyTimer::db_query("delete");
        sqlx::query(DELETE)
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|done| i64::try_from(done.rows_affected()).unwrap_or(i64::MAX))
            .map_err(|e| failed("delete", e))
    }
}
