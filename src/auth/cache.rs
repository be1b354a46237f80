//! Bounded, recently-used-eviction cache for resolved authentications.

use std::collections::HashMap;
use tokio::sync::Mutex;

use super::models::User;

pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Composite key: session id plus normalized client IP.
///
/// Two fields instead of the concatenated string so `("ab", "c")` and
/// `("a", "bc")` can never alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    session_id: String,
    ip_address: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(session_id: &str, ip_address: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            ip_address: ip_address.to_string(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[derive(Debug)]
struct CacheSlot {
    user: User,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    slots: HashMap<CacheKey, CacheSlot>,
    clock: u64,
}

/// Maps (session id, IP) to a resolved [`User`] snapshot.
///
/// Entries are derived data, always re-derivable from the store; presence
/// here is best-effort only. Every operation takes the single internal lock,
/// so a `get` never observes a partially evicted or inserted entry and
/// concurrent `put`s to one key leave exactly one winner.
#[derive(Debug)]
pub struct AuthenticationCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl AuthenticationCache {
    /// Capacity is fixed at construction. Capacity 0 disables caching.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a key, marking the entry most-recently-used on hit.
    pub async fn get(&self, key: &CacheKey) -> Option<User> {
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let clock = inner.clock;
        let slot = inner.slots.get_mut(key)?;
        slot.last_used = clock;
        Some(slot.user.clone())
    }

    /// Insert or refresh a key. At capacity, the single least-recently-used
    /// entry is evicted first.
    pub async fn put(&self, key: CacheKey, user: User) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let clock = inner.clock;
        inner.slots.insert(key, CacheSlot { user, last_used: clock });

        if inner.slots.len() > self.capacity {
            if let Some(oldest) = inner
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone())
            {
                inner.slots.remove(&oldest);
            }
        }
    }

    /// Drop every entry belonging to a session id, regardless of IP.
    pub async fn invalidate_session(&self, session_id: &str) {
        let mut inner = self.inner.lock().await;
        inner.slots.retain(|key, _| key.session_id != session_id);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.slots.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(id: i64) -> User {
        User::new(
            id,
            format!("user-{id}"),
            "$argon2id$stub".to_string(),
            format!("user-{id}@example.com"),
        )
    }

    fn key(n: usize) -> CacheKey {
        CacheKey::new(&format!("sess-{n}"), "10.0.0.1")
    }

    #[tokio::test]
    async fn get_returns_identical_snapshot() {
        let cache = AuthenticationCache::new(4);
        cache.put(key(1), user(1)).await;

        let first = cache.get(&key(1)).await.unwrap();
        let second = cache.get(&key(1)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn capacity_plus_one_evicts_first_inserted() {
        let cache = AuthenticationCache::new(3);
        for n in 1..=4 {
            cache.put(key(n), user(n as i64)).await;
        }

        assert_eq!(cache.len().await, 3);
        assert!(cache.get(&key(1)).await.is_none());
        assert!(cache.get(&key(4)).await.is_some());
    }

    #[tokio::test]
    async fn get_refreshes_recency() {
        let cache = AuthenticationCache::new(2);
        cache.put(key(1), user(1)).await;
        cache.put(key(2), user(2)).await;

        // Touch key 1 so key 2 becomes the eviction candidate.
        cache.get(&key(1)).await.unwrap();
        cache.put(key(3), user(3)).await;

        assert!(cache.get(&key(1)).await.is_some());
        assert!(cache.get(&key(2)).await.is_none());
    }

    #[tokio::test]
    async fn put_refreshes_existing_key_without_growth() {
        let cache = AuthenticationCache::new(2);
        cache.put(key(1), user(1)).await;
        cache.put(key(1), user(1)).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn invalidate_session_drops_all_ips() {
        let cache = AuthenticationCache::new(4);
        cache.put(CacheKey::new("sess-1", "10.0.0.1"), user(1)).await;
        cache.put(CacheKey::new("sess-1", "10.0.0.2"), user(1)).await;
        cache.put(CacheKey::new("sess-2", "10.0.0.1"), user(2)).await;

        cache.invalidate_session("sess-1").await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&CacheKey::new("sess-2", "10.0.0.1")).await.is_some());
    }

    #[tokio::test]
    async fn zero_capacity_disables_caching() {
        let cache = AuthenticationCache::new(0);
        cache.put(key(1), user(1)).await;
        assert!(cache.is_empty().await);
        assert!(cache.get(&key(1)).await.is_none());
    }
}
