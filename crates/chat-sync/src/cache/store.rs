//! Keyed query cache with staleness windows and explicit invalidation.

use crate::error::Result;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Resource namespace of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Message collection of one channel.
    Messages,
    /// Channel list of one server.
    Channels,
    Channel,
    /// The user's server list.
    Servers,
    Server,
    Profile,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub id: Option<String>,
}

impl CacheKey {
    pub fn new(kind: ResourceKind, id: Option<String>) -> Self {
        Self { kind, id }
    }

    pub fn messages(channel_id: &str) -> Self {
        Self::new(ResourceKind::Messages, Some(channel_id.to_string()))
    }

    pub fn channels(server_id: &str) -> Self {
        Self::new(ResourceKind::Channels, Some(server_id.to_string()))
    }

    pub fn channel(channel_id: &str) -> Self {
        Self::new(ResourceKind::Channel, Some(channel_id.to_string()))
    }

    pub fn servers() -> Self {
        Self::new(ResourceKind::Servers, None)
    }

    pub fn server(server_id: &str) -> Self {
        Self::new(ResourceKind::Server, Some(server_id.to_string()))
    }

    pub fn profile() -> Self {
        Self::new(ResourceKind::Profile, None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub fetched_at: Instant,
    pub stale_after: Duration,
    pub invalidated: bool,
}

impl CacheEntry {
    pub fn is_stale_at(&self, now: Instant) -> bool {
        self.invalidated || now.duration_since(self.fetched_at) >= self.stale_after
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }
}

#[derive(Debug, Default)]
struct Table {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Bumped by every invalidation.
    generation: u64,
    /// Generation of the latest invalidation touching each kind.
    invalidated_at: HashMap<ResourceKind, u64>,
    /// Generation of the latest `clear`.
    cleared_at: u64,
}

impl Table {
    fn bump(&mut self, kind: ResourceKind) {
        self.generation += 1;
        self.invalidated_at.insert(kind, self.generation);
    }

    /// Whether `kind` was invalidated after `generation`.
    fn invalidated_since(&self, kind: ResourceKind, generation: u64) -> bool {
        self.cleared_at > generation
            || self
                .invalidated_at
                .get(&kind)
                .is_some_and(|at| *at > generation)
    }
}

/// Shared cache table. Stale entries stay readable until replaced.
#[derive(Debug, Default)]
pub struct QueryCache {
    table: RwLock<Table>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.table.read().entries.get(key).cloned()
    }

    /// Decoded value of a fresh entry.
    pub fn fresh<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let table = self.table.read();
        let entry = table.entries.get(key)?;
        if entry.is_stale() {
            return None;
        }
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Cache entry {:?} does not decode: {}", key, e);
                None
            }
        }
    }

    /// Whether `key` needs a fetch. Missing entries are stale.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.table
            .read()
            .entries
            .get(key)
            .map_or(true, CacheEntry::is_stale)
    }

    /// Store a freshly fetched value.
    pub fn insert<T: Serialize + ?Sized>(
        &self,
        key: CacheKey,
        value: &T,
        stale_after: Duration,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.table.write().entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                stale_after,
                invalidated: false,
            },
        );
        Ok(())
    }

    /// Store a value fetched while the cache was at `generation`.
    ///
    /// If the key's kind was invalidated (or the cache cleared) since, the
    /// value is stored already invalidated: it may predate the write that
    /// caused the invalidation. Invalidations of other kinds do not count.
    pub fn insert_fetched<T: Serialize + ?Sized>(
        &self,
        key: CacheKey,
        value: &T,
        stale_after: Duration,
        generation: u64,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut table = self.table.write();
        let invalidated = table.invalidated_since(key.kind, generation);
        if invalidated {
            tracing::debug!("Storing {:?} as stale, invalidated during fetch", key);
        }
        table.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                stale_after,
                invalidated,
            },
        );
        Ok(())
    }

    pub fn generation(&self) -> u64 {
        self.table.read().generation
    }

    /// Mark one entry stale. Returns whether it existed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut table = self.table.write();
        table.bump(key.kind);
        match table.entries.get_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                true
            }
            None => false,
        }
    }

    /// Mark every entry of `kind` stale. Returns how many were marked.
    pub fn invalidate_kind(&self, kind: ResourceKind) -> usize {
        let mut table = self.table.write();
        table.bump(kind);
        let mut marked = 0;
        for (key, entry) in table.entries.iter_mut() {
            if key.kind == kind {
                entry.invalidated = true;
                marked += 1;
            }
        }
        marked
    }

    /// Drop everything, e.g. on logout.
    pub fn clear(&self) {
        let mut table = self.table.write();
        table.generation += 1;
        table.cleared_at = table.generation;
        table.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_goes_stale_after_window() {
        let cache = QueryCache::new();
        let key = CacheKey::messages("7");
        cache.insert(key.clone(), &vec!["a"], Duration::from_secs(30)).unwrap();

        assert_eq!(cache.fresh::<Vec<String>>(&key), Some(vec!["a".to_string()]));
        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!cache.is_stale(&key));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.is_stale(&key));
        assert_eq!(cache.fresh::<Vec<String>>(&key), None);
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn test_missing_entry_is_stale() {
        let cache = QueryCache::new();
        assert!(cache.is_stale(&CacheKey::servers()));
        assert!(!cache.invalidate(&CacheKey::servers()));
    }

    #[tokio::test]
    async fn test_invalidate_single_key() {
        let cache = QueryCache::new();
        cache.insert(CacheKey::messages("1"), &1, Duration::from_secs(60)).unwrap();
        cache.insert(CacheKey::messages("2"), &2, Duration::from_secs(60)).unwrap();

        assert!(cache.invalidate(&CacheKey::messages("1")));
        assert!(cache.is_stale(&CacheKey::messages("1")));
        assert!(!cache.is_stale(&CacheKey::messages("2")));
    }

    #[tokio::test]
    async fn test_invalidate_kind() {
        let cache = QueryCache::new();
        cache.insert(CacheKey::messages("1"), &1, Duration::from_secs(60)).unwrap();
        cache.insert(CacheKey::messages("2"), &2, Duration::from_secs(60)).unwrap();
        cache.insert(CacheKey::servers(), &3, Duration::from_secs(60)).unwrap();

        assert_eq!(cache.invalidate_kind(ResourceKind::Messages), 2);
        assert!(cache.is_stale(&CacheKey::messages("1")));
        assert!(cache.is_stale(&CacheKey::messages("2")));
        assert!(!cache.is_stale(&CacheKey::servers()));
    }

    #[tokio::test]
    async fn test_fetch_overlapping_invalidation_is_stored_stale() {
        let cache = QueryCache::new();
        let key = CacheKey::messages("1");
        let generation = cache.generation();

        cache.invalidate(&key);
        cache
            .insert_fetched(key.clone(), &1, Duration::from_secs(60), generation)
            .unwrap();
        assert!(cache.is_stale(&key));

        let generation = cache.generation();
        cache
            .insert_fetched(key.clone(), &2, Duration::from_secs(60), generation)
            .unwrap();
        assert!(!cache.is_stale(&key));
    }

    #[tokio::test]
    async fn test_unrelated_invalidation_keeps_fetch_fresh() {
        let cache = QueryCache::new();
        let generation = cache.generation();

        cache.invalidate(&CacheKey::messages("1"));
        cache
            .insert_fetched(CacheKey::servers(), &1, Duration::from_secs(60), generation)
            .unwrap();
        assert!(!cache.is_stale(&CacheKey::servers()));

        cache.clear();
        cache
            .insert_fetched(CacheKey::profile(), &2, Duration::from_secs(60), generation)
            .unwrap();
        assert!(cache.is_stale(&CacheKey::profile()));
    }
}
