//! On-disk format of the lookup cache
//!
//! The file is a JSON document `{version, saved_at, entries}`. The version
//! tag is checked before the entries are decoded; any mismatch discards the
//! whole store.

use super::{CacheEntry, CacheError, CacheKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Schema version of the persisted store
pub const SCHEMA_VERSION: &str = "3";

/// The persisted cache document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    pub version: String,
    pub saved_at: DateTime<Utc>,
    pub entries: Vec<StoredEntry>,
}

/// One key/entry pair in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub key: CacheKey,
    pub entry: CacheEntry,
}

/// Only the version tag, read before anything else
#[derive(Deserialize)]
struct StoreHeader {
    version: Option<String>,
}

/// Read and validate a store file
pub fn read_store(path: &Path) -> Result<CacheFile, CacheError> {
    let raw = fs::read_to_string(path)?;
    let header: StoreHeader = serde_json::from_str(&raw)?;

    let found = header.version.as_deref().unwrap_or("<missing>");
    if found != SCHEMA_VERSION {
        return Err(CacheError::IncompatibleVersion {
            found: found.to_string(),
            expected: SCHEMA_VERSION.to_string(),
        });
    }

    Ok(serde_json::from_str(&raw)?)
}

/// Write a store file atomically (temp file + rename)
pub fn write_store(path: &Path, file: &CacheFile) -> Result<(), CacheError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(file)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogLookup, CatalogShowInfo};
    use tempfile::TempDir;

    #[test]
    fn test_wrong_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"version": "1", "saved_at": "2024-01-01T00:00:00Z", "entries": []}"#,
        )
        .unwrap();

        match read_store(&path) {
            Err(CacheError::IncompatibleVersion { found, expected }) => {
                assert_eq!(found, "1");
                assert_eq!(expected, SCHEMA_VERSION);
            }
            other => panic!("expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"entries": []}"#).unwrap();

        assert!(matches!(
            read_store(&path),
            Err(CacheError::IncompatibleVersion { .. })
        ));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let file = CacheFile {
            version: SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            entries: vec![StoredEntry {
                key: CacheKey::title("Lost"),
                entry: CacheEntry::new(CatalogLookup::Absent, Utc::now()),
            }],
        };

        write_store(&path, &file).unwrap();
        let back = read_store(&path).unwrap();

        assert_eq!(back.entries, file.entries);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_found_entry_survives_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let info = CatalogShowInfo::from_episode_seasons(
            [Some(0), Some(1), Some(1), Some(2), None].into_iter(),
        );
        let file = CacheFile {
            version: SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            entries: vec![
                StoredEntry {
                    key: CacheKey::external_id("tt0903747"),
                    entry: CacheEntry::new(CatalogLookup::Found(info.clone()), Utc::now()),
                },
                StoredEntry {
                    key: CacheKey::title("Nowhere"),
                    entry: CacheEntry::new(CatalogLookup::Absent, Utc::now()),
                },
            ],
        };

        write_store(&path, &file).unwrap();
        let back = read_store(&path).unwrap();

        assert_eq!(back.entries, file.entries);
        assert_eq!(back.entries[0].entry.value, CatalogLookup::Found(info));
    }

    #[test]
    fn test_previous_schema_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"version": "2", "saved_at": "2024-01-01T00:00:00Z", "entries": []}"#,
        )
        .unwrap();

        assert!(matches!(
            read_store(&path),
            Err(CacheError::IncompatibleVersion { .. })
        ));
    }
}
