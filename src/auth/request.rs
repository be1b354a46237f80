//! Per-request authentication: cache first, store on miss, never raises.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::authenticator::Authenticator;
use super::cache::{AuthenticationCache, CacheKey};
use super::error::AuthError;
use super::models::User;

/// Strip any port suffix from a raw connection address.
///
/// Parses socket-address forms first so IPv6 literals like `[::1]:8080`
/// survive; a bare IP or anything unparseable passes through trimmed.
#[must_use]
pub fn normalize_ip(remote_addr: &str) -> String {
    let trimmed = remote_addr.trim();
    if let Ok(addr) = trimmed.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }
    if let Ok(ip) = trimmed.parse::<IpAddr>() {
        return ip.to_string();
    }
    trimmed.to_string()
}

/// Resolves the authenticated user for one request.
///
/// Consults the shared cache before the store and repopulates it on a
/// successful resolution. Every failure collapses to `None` — absence of a
/// user means "anonymous", never an error the dispatch layer must handle.
#[derive(Clone)]
pub struct RequestAuthenticator {
    authenticator: Authenticator,
    cache: Arc<AuthenticationCache>,
}

impl RequestAuthenticator {
    #[must_use]
    pub fn new(authenticator: Authenticator, cache: Arc<AuthenticationCache>) -> Self {
        Self {
            authenticator,
            cache,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &AuthenticationCache {
        &self.cache
    }

    /// Resolve (session id, client IP) to a user, if the binding checks out.
    pub async fn authenticate(&self, session_id: &str, client_ip: &str) -> Option<User> {
        let key = CacheKey::new(session_id, client_ip);

        if let Some(user) = self.cache.get(&key).await {
            debug!(session_id, "authentication cache hit");
            return Some(user);
        }

        match self
            .authenticator
            .resolve_authentication(session_id, client_ip)
            .await
        {
            Ok((_, user)) => {
                self.cache.put(key, user.clone()).await;
                Some(user)
            }
            Err(AuthError::UnknownSession) => {
                debug!(session_id, "no binding for session");
                None
            }
            Err(AuthError::IpMismatch) => {
                // Existing session presented from a different network origin.
                warn!(session_id, client_ip, "session ip mismatch");
                None
            }
            Err(err) => {
                error!(session_id, %err, "authentication resolution failed");
                None
            }
        }
    }

    /// Delete the session's binding, then drop its cache entries so a
    /// logged-out session can never resolve from stale cache.
    pub async fn logout(&self, session_id: &str) {
        self.authenticator.logout(session_id).await;
        self.cache.invalidate_session(session_id).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::error::StoreError;
    use crate::auth::models::AuthenticationBinding;
    use crate::auth::store::{AuthenticationStore, MemoryStore};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn normalize_ip_strips_port() {
        assert_eq!(normalize_ip("10.0.0.1:43512"), "10.0.0.1");
        assert_eq!(normalize_ip("10.0.0.1"), "10.0.0.1");
        assert_eq!(normalize_ip("[::1]:8080"), "::1");
        assert_eq!(normalize_ip(" ::1 "), "::1");
        assert_eq!(normalize_ip("not-an-address"), "not-an-address");
    }

    /// Counts binding lookups to observe store round-trips.
    struct CountingStore {
        inner: MemoryStore,
        binding_lookups: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                binding_lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AuthenticationStore for CountingStore {
        async fn create_user(
            &self,
            username: &str,
            email: &str,
            password_hash: &str,
        ) -> Result<i64, StoreError> {
            self.inner.create_user(username, email, password_hash).await
        }

        async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
            self.inner.find_user_by_username(username).await
        }

        async fn find_binding(
            &self,
            session_id: &str,
        ) -> Result<(AuthenticationBinding, User), StoreError> {
            self.binding_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_binding(session_id).await
        }

        async fn insert_binding(
            &self,
            session_id: &str,
            user_id: i64,
            ip_address: &str,
        ) -> Result<(), StoreError> {
            self.inner.insert_binding(session_id, user_id, ip_address).await
        }

        async fn delete_binding(&self, session_id: &str) -> Result<(), StoreError> {
            self.inner.delete_binding(session_id).await
        }
    }

    async fn logged_in(store: Arc<CountingStore>) -> RequestAuthenticator {
        let authenticator = Authenticator::new(store);
        authenticator
            .create_user(
                "alice",
                "alice@example.com",
                &SecretString::from("secret1".to_string()),
            )
            .await
            .unwrap();
        authenticator
            .login(
                "alice",
                &SecretString::from("secret1".to_string()),
                "10.0.0.1",
                "sess-1",
            )
            .await
            .unwrap();
        RequestAuthenticator::new(authenticator, Arc::new(AuthenticationCache::new(10)))
    }

    #[tokio::test]
    async fn cache_hit_spares_the_store() {
        let store = Arc::new(CountingStore::new());
        let request_auth = logged_in(store.clone()).await;
        let lookups_after_login = store.binding_lookups.load(Ordering::SeqCst);

        let first = request_auth.authenticate("sess-1", "10.0.0.1").await.unwrap();
        let second = request_auth.authenticate("sess-1", "10.0.0.1").await.unwrap();

        assert_eq!(first, second);
        // One miss populated the cache; the second call never hit the store.
        assert_eq!(
            store.binding_lookups.load(Ordering::SeqCst),
            lookups_after_login + 1
        );
    }

    #[tokio::test]
    async fn failures_collapse_to_anonymous() {
        let store = Arc::new(CountingStore::new());
        let request_auth = logged_in(store).await;

        assert!(request_auth.authenticate("sess-2", "10.0.0.1").await.is_none());
        assert!(request_auth.authenticate("sess-1", "10.0.0.2").await.is_none());
        assert!(request_auth.authenticate("sess-1", "10.0.0.1").await.is_some());
    }

    #[tokio::test]
    async fn logout_invalidates_cache_entries() {
        let store = Arc::new(CountingStore::new());
        let request_auth = logged_in(store).await;

        assert!(request_auth.authenticate("sess-1", "10.0.0.1").await.is_some());
        request_auth.logout("sess-1").await;

        // Neither the store binding nor the cached entry survives.
        assert!(request_auth.authenticate("sess-1", "10.0.0.1").await.is_none());
        assert!(request_auth.cache().is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_resolutions_converge_to_one_entry() {
        let store = Arc::new(CountingStore::new());
        let request_auth = logged_in(store.clone()).await;
        let lookups_after_login = store.binding_lookups.load(Ordering::SeqCst);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let request_auth = request_auth.clone();
                tokio::spawn(async move { request_auth.authenticate("sess-1", "10.0.0.1").await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }

        // Round-trips are bounded by the task count and at least one
        // happened; afterwards the cache holds a single consistent entry.
        let lookups = store.binding_lookups.load(Ordering::SeqCst) - lookups_after_login;
        assert!((1..=16).contains(&lookups));
        assert_eq!(request_auth.cache().len().await, 1);
    }
}
