//! Storage contract for users.

use async_trait::async_trait;

use crate::error::RepositoryError;

use super::model::{User, UserPatch};

/// Storage operations for [`User`] records.
///
/// Mutating operations return an affected-row count: `> 0` success, `0` no
/// matching row (or, for `create`, an existing row with the same id), `< 0`
/// a conflicting write.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, ordered by id.
    async fn all(&self) -> Result<Vec<User>, RepositoryError>;

    /// A single user, `None` when absent.
    async fn load(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Insert a new user.
    async fn create(&self, user: &User) -> Result<i64, RepositoryError>;

    /// Replace every column of an existing user.
    async fn update(&self, user: &User) -> Result<i64, RepositoryError>;

    /// Update only the columns listed in the patch.
    async fn patch(&self, patch: &UserPatch) -> Result<i64, RepositoryError>;

    /// Remove a user.
    async fn delete(&self, id: &str) -> Result<i64, RepositoryError>;
}
