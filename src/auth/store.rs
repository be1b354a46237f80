//! The persistence contract behind users and session bindings.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::error::StoreError;
use super::models::{AuthenticationBinding, User};

/// Durable user and session-binding records.
///
/// Each call is atomic at the store boundary; the core never spans a
/// transaction across calls. Implementations map their backend's duplicate
/// and missing-row conditions onto [`StoreError::DuplicateUsername`] and
/// [`StoreError::NotFound`]; everything else passes through as
/// [`StoreError::Backend`].
#[async_trait]
pub trait AuthenticationStore: Send + Sync {
    /// Create a user and return the store-assigned id.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError>;

    /// Look up the binding for a session id together with its user.
    async fn find_binding(
        &self,
        session_id: &str,
    ) -> Result<(AuthenticationBinding, User), StoreError>;

    /// Bind a session id to a user and IP. A session id carries at most one
    /// binding: inserting over an existing one replaces it.
    async fn insert_binding(
        &self,
        session_id: &str,
        user_id: i64,
        ip_address: &str,
    ) -> Result<(), StoreError>;

    /// Delete the binding for a session id. Idempotent; deleting a
    /// non-existent binding is not an error.
    async fn delete_binding(&self, session_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    users: HashMap<i64, User>,
    ids_by_username: HashMap<String, i64>,
    bindings: HashMap<String, AuthenticationBinding>,
    next_id: i64,
}

/// In-memory store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bindings, for assertions in tests.
    pub async fn binding_count(&self) -> usize {
        self.inner.lock().await.bindings.len()
    }
}

#[async_trait]
impl AuthenticationStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.ids_by_username.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        let user = User::new(
            id,
            username.to_string(),
            password_hash.to_string(),
            email.to_string(),
        );
        inner.ids_by_username.insert(username.to_string(), id);
        inner.users.insert(id, user);
        Ok(id)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let inner = self.inner.lock().await;
        let id = inner
            .ids_by_username
            .get(username)
            .ok_or(StoreError::NotFound)?;
        inner.users.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn find_binding(
        &self,
        session_id: &str,
    ) -> Result<(AuthenticationBinding, User), StoreError> {
        let inner = self.inner.lock().await;
        let binding = inner.bindings.get(session_id).ok_or(StoreError::NotFound)?;
        let user = inner
            .users
            .get(&binding.user_id())
            .cloned()
            .ok_or(StoreError::NotFound)?;
        Ok((binding.clone(), user))
    }

    async fn insert_binding(
        &self,
        session_id: &str,
        user_id: i64,
        ip_address: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.bindings.insert(
            session_id.to_string(),
            AuthenticationBinding::new(session_id.to_string(), user_id, ip_address.to_string()),
        );
        Ok(())
    }

    async fn delete_binding(&self, session_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.bindings.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_user_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let first = store.create_user("alice", "alice@example.com", "h1").await.unwrap();
        let second = store.create_user("bob", "bob@example.com", "h2").await.unwrap();
        assert_ne!(first, second);

        let user = store.find_user_by_username("alice").await.unwrap();
        assert_eq!(user.id(), first);
        assert_eq!(user.recovery_email(), "alice@example.com");
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryStore::new();
        store.create_user("alice", "a@example.com", "h1").await.unwrap();
        let err = store.create_user("alice", "b@example.com", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));
    }

    #[tokio::test]
    async fn insert_binding_replaces_existing() {
        let store = MemoryStore::new();
        let id = store.create_user("alice", "a@example.com", "h1").await.unwrap();
        store.insert_binding("sess-1", id, "10.0.0.1").await.unwrap();
        store.insert_binding("sess-1", id, "10.0.0.2").await.unwrap();

        let (binding, _) = store.find_binding("sess-1").await.unwrap();
        assert_eq!(binding.ip_address(), "10.0.0.2");
        assert_eq!(store.binding_count().await, 1);
    }

    #[tokio::test]
    async fn delete_binding_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.create_user("alice", "a@example.com", "h1").await.unwrap();
        store.insert_binding("sess-1", id, "10.0.0.1").await.unwrap();

        store.delete_binding("sess-1").await.unwrap();
        store.delete_binding("sess-1").await.unwrap();
        assert!(matches!(
            store.find_binding("sess-1").await.unwrap_err(),
            StoreError::NotFound
        ));
    }
}
