//! User service layer.

use std::sync::Arc;

use crate::error::RepositoryError;

use super::model::{User, UserPatch};
use super::repository::UserRepository;

/// Orchestrates user operations between the HTTP layer and the repository.
///
/// Currently forwards every call unchanged.
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

impl UserService {
    /// Create a service over a repository.
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// All users.
    pub async fn all(&self) -> Result<Vec<User>, RepositoryError> {
        self.repository.all().await
    }

    /// A single user, `None` when absent.
    pub async fn load(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        self.repository.load(id).await
    }

    /// Insert a user.
    pub async fn create(&self, user: &User) -> Result<i64, RepositoryError> {
        self.repository.create(user).await
    }

    /// Replace a user.
    pub async fn update(&self, user: &User) -> Result<i64, RepositoryError> {
        self.repository.update(user).await
    }

    /// Apply a partial update.
    pub async fn patch(&self, patch: &UserPatch) -> Result<i64, RepositoryError> {
        self.repository.patch(patch).await
    }

    /// Delete a user.
    pub async fn delete(&self, id: &str) -> Result<i64, RepositoryError> {
        self.repository.delete(id).await
    }
}
