use std::collections::VecDeque;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::models::Track;

/// A fetch result as cached: `None` records a failed fetch.
pub type CachedTracks = Option<Vec<Track>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey {
    pub username: String,
    pub period: String,
    pub limit: u32,
}

impl QueryKey {
    pub fn new(username: &str, period: &str, limit: u32) -> Self {
        Self {
            username: username.to_string(),
            period: period.to_string(),
            limit,
        }
    }
}

struct CacheEntry {
    key: QueryKey,
    tracks: CachedTracks,
    stored_at: Instant,
}

/// Memoizes top-track fetches by exact `(username, period, limit)`.
///
/// Entries are kept most-recently-used first; inserting past `capacity` evicts
/// the least recently used one. With capacity 1 a different key always
/// replaces the previous entry. Failed fetches are cached too and replayed
/// until evicted or expired.
pub struct QueryCache {
    capacity: usize,
    ttl: Option<Duration>,
    entries: Mutex<VecDeque<CacheEntry>>,
}

impl QueryCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            ttl,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn single_slot() -> Self {
        Self::new(1, None)
    }

    /// `Some(cached)` on a hit, where `cached` may itself record a failure.
    pub async fn get(&self, key: &QueryKey) -> Option<CachedTracks> {
        let mut entries = self.entries.lock().await;
        let position = entries.iter().position(|entry| &entry.key == key)?;

        if self.is_expired(&entries[position]) {
            entries.remove(position);
            return None;
        }

        let entry = entries.remove(position)?;
        let tracks = entry.tracks.clone();
        entries.push_front(entry);
        Some(tracks)
    }

    pub async fn insert(&self, key: QueryKey, tracks: CachedTracks) {
        let mut entries = self.entries.lock().await;
        entries.retain(|entry| entry.key != key);
        entries.push_front(CacheEntry {
            key,
            tracks,
            stored_at: Instant::now(),
        });
        entries.truncate(self.capacity);
    }

    /// Return the cached result for `key`, or run `fetch` and cache whatever it returns.
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetch: F) -> CachedTracks
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CachedTracks>,
    {
        if let Some(cached) = self.get(&key).await {
            tracing::info!("Using cached tracks for {}", key.username);
            return cached;
        }

        let tracks = fetch().await;
        self.insert(key, tracks.clone()).await;
        tracks
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl.is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}
