//! Durable catalog lookup cache
//!
//! Shared by every reconciliation worker. Reads and writes go through a
//! sharded concurrent map, so callers need no locking of their own. The
//! backing file is read once by [`LookupCache::load`] and written once by
//! [`LookupCache::save`].

mod store;

pub use store::{CacheFile, StoredEntry, SCHEMA_VERSION};

use crate::catalog::CatalogLookup;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Entries older than this are treated as not cached
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Errors from the persisted cache store
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache schema version {found} is incompatible (expected {expected})")]
    IncompatibleVersion { found: String, expected: String },
}

/// Identity of a catalog lookup.
///
/// The kind is part of the key, so an id and a title with the same text
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CacheKey {
    ExternalId(String),
    Title(String),
}

impl CacheKey {
    pub fn external_id(id: &str) -> Self {
        CacheKey::ExternalId(id.trim().to_string())
    }

    /// Title key, case-folded and trimmed
    pub fn title(title: &str) -> Self {
        CacheKey::Title(title.trim().to_lowercase())
    }
}

/// A cached lookup result with its creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub created_at: DateTime<Utc>,
    pub value: CatalogLookup,
}

impl CacheEntry {
    pub fn new(value: CatalogLookup, created_at: DateTime<Utc>) -> Self {
        Self { created_at, value }
    }

    /// Whether the entry has outlived `max_age` at `now`
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.created_at > max_age
    }
}

/// Concurrent lookup cache with optional file backing
pub struct LookupCache {
    entries: DashMap<CacheKey, CacheEntry>,
    path: Option<PathBuf>,
    max_age: Duration,
}

impl LookupCache {
    /// Cache that is never persisted
    pub fn in_memory() -> Self {
        Self {
            entries: DashMap::new(),
            path: None,
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
        }
    }

    /// Load the cache backed by `path`.
    ///
    /// A missing, unreadable or incompatible file yields an empty cache;
    /// this never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut cache = Self::in_memory();

        if path.exists() {
            match store::read_store(&path) {
                Ok(file) => {
                    let now = Utc::now();
                    let total = file.entries.len();
                    let mut expired = 0;
                    for stored in file.entries {
                        if stored.entry.is_expired(now, cache.max_age) {
                            expired += 1;
                        }
                        cache.entries.insert(stored.key, stored.entry);
                    }
                    log::info!(
                        "Loaded catalog cache from {:?}: {} entries ({} expired)",
                        path,
                        total,
                        expired
                    );
                }
                Err(e) => {
                    log::warn!(
                        "Discarding catalog cache at {:?}: {}. Starting with empty cache.",
                        path,
                        e
                    );
                }
            }
        } else {
            log::info!("No catalog cache at {:?}. Starting with empty cache.", path);
        }

        cache.path = Some(path);
        cache
    }

    /// Override the expiration threshold
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a live entry; expired entries read as not cached
    pub fn get(&self, key: &CacheKey) -> Option<CatalogLookup> {
        self.get_at(key, Utc::now())
    }

    /// Look up a live entry as of `now`
    pub fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CatalogLookup> {
        let entry = self.entries.get(key)?;
        if entry.is_expired(now, self.max_age) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store a result stamped with the current time, replacing any entry
    pub fn put(&self, key: CacheKey, value: CatalogLookup) {
        self.insert_entry(key, CacheEntry::new(value, Utc::now()));
    }

    /// Store a pre-built entry
    pub fn insert_entry(&self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    /// Raw entry, expired or not
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Number of entries held in memory (including expired ones)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every live entry, sorted by key
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<StoredEntry> {
        let mut live: Vec<StoredEntry> = self
            .entries
            .iter()
            .filter(|e| !e.value().is_expired(now, self.max_age))
            .map(|e| StoredEntry {
                key: e.key().clone(),
                entry: e.value().clone(),
            })
            .collect();
        live.sort_by(|a, b| a.key.cmp(&b.key));
        live
    }

    /// Persist to the backing file, dropping expired entries.
    ///
    /// Returns the number of entries written. An in-memory cache writes
    /// nothing.
    pub fn save(&self) -> Result<usize, CacheError> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Ok(0),
        }
    }

    /// Persist to an explicit location
    pub fn save_to(&self, path: &Path) -> Result<usize, CacheError> {
        let now = Utc::now();
        let entries = self.snapshot(now);
        let count = entries.len();

        let file = CacheFile {
            version: SCHEMA_VERSION.to_string(),
            saved_at: now,
            entries,
        };
        store::write_store(path, &file)?;

        log::info!(
            "Saved catalog cache to {:?}: {} entries ({} expired dropped)",
            path,
            count,
            self.len().saturating_sub(count)
        );
        Ok(count)
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogShowInfo;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn found(seasons: u32) -> CatalogLookup {
        CatalogLookup::Found(CatalogShowInfo::from_episode_seasons(
            (1..=seasons).map(Some),
        ))
    }

    #[test]
    fn test_title_key_is_normalized() {
        assert_eq!(CacheKey::title("  The Office "), CacheKey::title("the office"));
    }

    #[test]
    fn test_key_kinds_do_not_collide() {
        let cache = LookupCache::in_memory();
        cache.put(CacheKey::ExternalId("lost".to_string()), found(1));
        cache.put(CacheKey::title("lost"), CatalogLookup::Absent);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&CacheKey::ExternalId("lost".to_string())), Some(found(1)));
        assert_eq!(cache.get(&CacheKey::title("Lost")), Some(CatalogLookup::Absent));
    }

    #[test]
    fn test_put_then_get_returns_value() {
        let cache = LookupCache::in_memory();
        let key = CacheKey::external_id("tt0411008");
        cache.put(key.clone(), found(6));

        let later = Utc::now() + Duration::days(29);
        assert_eq!(cache.get_at(&key, later), Some(found(6)));
    }

    #[test]
    fn test_put_overwrites() {
        let cache = LookupCache::in_memory();
        let key = CacheKey::title("Dark");
        cache.put(key.clone(), CatalogLookup::Absent);
        cache.put(key.clone(), found(3));

        assert_eq!(cache.get(&key), Some(found(3)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_not_cached() {
        let cache = LookupCache::in_memory();
        let key = CacheKey::title("Firefly");
        let old = Utc::now() - Duration::days(31);
        cache.insert_entry(key.clone(), CacheEntry::new(found(1), old));

        assert_eq!(cache.get(&key), None);
        // Still physically present until the next save
        assert!(cache.entry(&key).is_some());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let cache = LookupCache::load(dir.path().join("absent.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, b"\x00\x01 definitely not json").unwrap();

        let cache = LookupCache::load(&path);

        assert!(cache.is_empty());
        assert_eq!(cache.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_drops_expired_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let cache = LookupCache::load(&path);

        cache.put(CacheKey::title("fresh"), found(2));
        cache.insert_entry(
            CacheKey::title("stale"),
            CacheEntry::new(found(1), Utc::now() - Duration::days(45)),
        );

        assert_eq!(cache.save().unwrap(), 1);

        let reloaded = LookupCache::load(&path);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.entry(&CacheKey::title("stale")).is_none());
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let cache = LookupCache::in_memory();
        cache.put(CacheKey::title("x"), CatalogLookup::Absent);
        assert_eq!(cache.save().unwrap(), 0);
    }

    #[test]
    fn test_concurrent_puts_on_same_key() {
        let cache = Arc::new(LookupCache::in_memory());
        let key = CacheKey::title("contended");

        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let cache = Arc::clone(&cache);
                let key = key.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        cache.put(key.clone(), found(n));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let survivor = cache.get(&key).unwrap();
        let seasons = survivor.show().unwrap().total_seasons;
        assert!((1..=8).contains(&seasons));
        assert_eq!(survivor, found(seasons));
    }
}
