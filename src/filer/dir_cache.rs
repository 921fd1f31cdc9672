//! Directory cache used while walking a path's ancestry.
//!
//! The cache only ever holds copies of directory entries; the entry store
//! stays authoritative. Shallow directories get a shorter TTL than deep ones
//! because unrelated writes elsewhere in the tree touch them more often.

use crate::config::CacheConfig;
use crate::meta::entry::Entry;
use crate::meta::path::FullPath;
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// TTL for an ancestor at 1-based `level` of the walk: `60 - 6 * level`
/// minutes below level 10, one hour from there on.
pub fn ttl_for_level(level: usize) -> Duration {
    let minutes = if level < 10 { 60 - 6 * level as u64 } else { 60 };
    Duration::from_secs(minutes * 60)
}

#[async_trait]
pub trait DirectoryCache: Send + Sync {
    /// `None` on miss or expiry.
    async fn get(&self, path: &FullPath) -> Option<Entry>;

    async fn set(&self, path: &FullPath, entry: &Entry, ttl: Duration);

    async fn delete(&self, path: &FullPath);
}

/// Build the cache described by `cfg`.
pub fn directory_cache_from_config(cfg: &CacheConfig) -> Arc<dyn DirectoryCache> {
    if cfg.enabled {
        Arc::new(MokaDirectoryCache::new(cfg.max_entries))
    } else {
        Arc::new(NoopDirectoryCache)
    }
}

/// Disabled cache: every lookup misses, nothing is stored.
pub struct NoopDirectoryCache;

#[async_trait]
impl DirectoryCache for NoopDirectoryCache {
    async fn get(&self, _path: &FullPath) -> Option<Entry> {
        None
    }

    async fn set(&self, _path: &FullPath, _entry: &Entry, _ttl: Duration) {}

    async fn delete(&self, _path: &FullPath) {}
}

#[derive(Clone)]
struct CachedDirectory {
    entry: Arc<Entry>,
    ttl: Duration,
}

/// Per-item TTL carried by the cached value itself.
struct ItemTtl;

impl Expiry<FullPath, CachedDirectory> for ItemTtl {
    fn expire_after_create(
        &self,
        _key: &FullPath,
        value: &CachedDirectory,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &FullPath,
        value: &CachedDirectory,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded LRU cache with per-item expiry.
pub struct MokaDirectoryCache {
    inner: Cache<FullPath, CachedDirectory>,
}

impl MokaDirectoryCache {
    pub fn new(max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(ItemTtl)
            .build();
        Self { inner }
    }

    /// Number of live items, after pending evictions are applied.
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub async fn contains(&self, path: &FullPath) -> bool {
        self.inner.contains_key(path)
    }
}

#[async_trait]
impl DirectoryCache for MokaDirectoryCache {
    async fn get(&self, path: &FullPath) -> Option<Entry> {
        self.inner.get(path).await.map(|c| (*c.entry).clone())
    }

    async fn set(&self, path: &FullPath, entry: &Entry, ttl: Duration) {
        let value = CachedDirectory {
            entry: Arc::new(entry.clone()),
            ttl,
        };
        self.inner.insert(path.clone(), value).await;
    }

    async fn delete(&self, path: &FullPath) {
        self.inner.invalidate(path).await;
    }
}
