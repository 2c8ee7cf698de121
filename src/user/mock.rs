//! In-memory user repository for tests and database-less runs.
//!
//! Mirrors the affected-count semantics of the SQL adapter without a database.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::RepositoryError;

use super::model::{User, UserPatch};
use super::repository::UserRepository;

/// In-memory [`UserRepository`].
#[derive(Debug, Clone, Default)]
pub struct MockUserRepository {
    users: Arc<RwLock<BTreeMap<String, User>>>,
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with users.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let map = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: Arc::new(RwLock::new(map)),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail with [`RepositoryError::Unavailable`].
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of repository calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of a stored user.
    pub async fn get(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    fn enter(&self) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "mock repository failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn all(&self) -> Result<Vec<User>, RepositoryError> {
        self.enter()?;
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn load(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        self.enter()?;
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn create(&self, user: &User) -> Result<i64, RepositoryError> {
        self.enter()?;
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Ok(0);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(1)
    }

    async fn update(&self, user: &User) -> Result<i64, RepositoryError> {
        self.enter()?;
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn patch(&self, patch: &UserPatch) -> Result<i64, RepositoryError> {
        self.enter()?;
        if patch.is_empty() {
            return Ok(0);
        }
        let mut users = self.users.write().await;
        match users.get_mut(&patch.id) {
            Some(stored) => {
                patch
                    .apply_to(stored)
                    .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: &str) -> Result<i64, RepositoryError> {
        self.enter()?;
        Ok(self.users.write().await.remove(id).map_or(0, |_| 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            username: Some(format!("user{id}")),
            ..User::default()
        }
    }

    #[tokio::test]
    async fn create_twice_reports_zero() {
        let repo = MockUserRepository::new();
        assert_eq!(repo.create(&user("1")).await.unwrap(), 1);
        assert_eq!(repo.create(&user("1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_rows_report_zero() {
        let repo = MockUserRepository::new();
        assert_eq!(repo.update(&user("1")).await.unwrap(), 0);
        assert_eq!(repo.delete("1").await.unwrap(), 0);
        assert!(repo.load("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_is_ordered_by_id() {
        let repo = MockUserRepository::with_users([user("b"), user("a"), user("c")]);
        let ids: Vec<_> = repo.all().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failing_repository_counts_calls() {
        let repo = MockUserRepository::new();
        repo.set_failing(true);
        assert!(repo.all().await.is_err());
        assert!(repo.delete("1").await.is_err());
        assert_eq!(repo.calls(), 2);
    }
}
