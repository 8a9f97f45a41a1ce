//! TTL-based read cache in front of a player state backend.
//!
//! [`CachedPlayerStateRepo`] invalidates on write: a save reaches the backend
//! and then drops the cached copy, so the next read refills from the backend
//! and always sees the latest write that backend accepted. Concurrent saves
//! for one player therefore cannot leave the cache holding the older of two
//! writes. A read that races a save can still cache the value it fetched
//! before the save landed, for at most one TTL.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ghostplay_domain::{Leader, PlayerId};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{PlayerStateRepo, RepoError, StoredPlayerState};

/// Every this many inserts, expired entries are swept.
const SWEEP_EVERY: usize = 64;

/// A thread-safe cache with time-to-live expiration.
///
/// Entries are considered expired after the configured TTL. An expired entry
/// is removed when a `get` finds it, and every [`SWEEP_EVERY`] inserts all
/// expired entries are swept, so the cache stays bounded by recent traffic.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, TtlEntry<V>>>,
    ttl: Duration,
    inserts: AtomicUsize,
}

struct TtlEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Create a new cache with the specified TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            inserts: AtomicUsize::new(0),
        }
    }

    /// Insert a value, replacing any existing entry and resetting the TTL.
    pub async fn insert(&self, key: K, value: V) {
        self.store(key, value, Instant::now()).await;
    }

    /// Insert a value with an explicit timestamp (tests only).
    #[cfg(test)]
    pub async fn insert_at(&self, key: K, value: V, inserted_at: Instant) {
        self.store(key, value, inserted_at).await;
    }

    async fn store(&self, key: K, value: V, inserted_at: Instant) {
        let mut guard = self.entries.write().await;
        guard.insert(key, TtlEntry { value, inserted_at });

        if self.inserts.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            let before = guard.len();
            guard.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
            let swept = before - guard.len();
            if swept > 0 {
                tracing::trace!(swept, "Swept expired cache entries");
            }
        }
    }

    /// Get a value if it exists and hasn't expired. An expired entry is removed.
    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let guard = self.entries.read().await;
            match guard.get(key) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Re-check under the write lock: an insert may have refreshed the key.
        let mut guard = self.entries.write().await;
        if guard
            .get(key)
            .is_some_and(|entry| entry.inserted_at.elapsed() >= self.ttl)
        {
            guard.remove(key);
        }
        None
    }

    /// Remove and return a value if it exists (regardless of expiration).
    pub async fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().await.remove(key).map(|e| e.value)
    }

    /// Remove all expired entries and return the count of removed entries.
    pub async fn cleanup_expired(&self) -> usize {
        let mut guard = self.entries.write().await;
        let before_count = guard.len();
        guard.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before_count - guard.len()
    }

    /// Get the current number of entries (including expired ones not yet cleaned).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// =============================================================================
// Cached player state repository
// =============================================================================

/// Read cache decorator for any [`PlayerStateRepo`].
///
/// Lookups by id are served from the cache while fresh. Phrase lookups and
/// leaderboards always reach the backend; phrase hits are cached by id.
/// Creates and saves go to the backend and evict the id.
pub struct CachedPlayerStateRepo {
    inner: Arc<dyn PlayerStateRepo>,
    cache: TtlCache<PlayerId, StoredPlayerState>,
}

impl CachedPlayerStateRepo {
    pub fn new(inner: Arc<dyn PlayerStateRepo>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.cache.cleanup_expired().await
    }

    /// Entries currently held, expired or not.
    pub async fn cached_len(&self) -> usize {
        self.cache.len().await
    }
}

#[async_trait]
impl PlayerStateRepo for CachedPlayerStateRepo {
    async fn get(&self, id: PlayerId) -> Result<Option<StoredPlayerState>, RepoError> {
        if let Some(hit) = self.cache.get(&id).await {
            tracing::trace!(player_id = %id, "Player state cache hit");
            return Ok(Some(hit));
        }

        let found = self.inner.get(id).await?;
        if let Some(state) = &found {
            self.cache.insert(id, state.clone()).await;
        }
        Ok(found)
    }

    async fn get_by_phrase(&self, phrase: &str) -> Result<Option<StoredPlayerState>, RepoError> {
        let found = self.inner.get_by_phrase(phrase).await?;
        if let Some(state) = &found {
            self.cache.insert(state.id, state.clone()).await;
        }
        Ok(found)
    }

    async fn create(&self, state: &StoredPlayerState) -> Result<(), RepoError> {
        let result = self.inner.create(state).await;
        if !state.id.is_nil() {
            self.cache.remove(&state.id).await;
        }
        result
    }

    async fn save(&self, state: &StoredPlayerState) -> Result<PlayerId, RepoError> {
        let result = self.inner.save(state).await;
        // Evict on failure too: the backend may or may not have applied the write.
        match &result {
            Ok(id) => {
                self.cache.remove(id).await;
            }
            Err(_) if !state.id.is_nil() => {
                self.cache.remove(&state.id).await;
            }
            Err(_) => {}
        }
        result
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<Leader>, RepoError> {
        self.inner.leaderboard(limit).await
    }
}
