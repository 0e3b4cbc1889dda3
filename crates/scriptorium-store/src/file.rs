//! On-disk unit cache

use crate::CacheError;
use async_trait::async_trait;
use scriptorium_domain::traits::UnitCache;
use scriptorium_domain::{CacheEntry, CacheKey};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// File-backed cache, one JSON document per `(phase, unit)`
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the entry for `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(key.phase.as_str())
            .join(format!("{}.json", key.unit_id))
    }
}

#[async_trait]
impl UnitCache for FileCache {
    type Error = CacheError;

    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, Self::Error> {
        let path = self.path_for(key);
        let key = key.clone();
        tokio::task::spawn_blocking(move || read_entry(&path, &key))
            .await
            .map_err(|e| CacheError::Io(io::Error::other(e)))?
    }

    async fn store(&self, entry: &CacheEntry) -> Result<(), Self::Error> {
        let path = self.path_for(&entry.key());
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || write_json_atomic(&path, &entry))
            .await
            .map_err(|e| CacheError::Io(io::Error::other(e)))?
    }

    async fn remove(&self, key: &CacheKey) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(CacheError::Io(e)),
            _ => Ok(()),
        })
        .await
        .map_err(|e| CacheError::Io(io::Error::other(e)))?
    }
}

fn read_entry(path: &Path, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::Io(e)),
    };

    let entry: CacheEntry = serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
        key: key.to_string(),
        detail: e.to_string(),
    })?;
    if entry.key() != *key {
        return Err(CacheError::Corrupt {
            key: key.to_string(),
            detail: format!("entry belongs to {}", entry.key()),
        });
    }
    debug!("Cache hit for {}", key);
    Ok(Some(entry))
}

/// Write `value` as pretty JSON to `path` atomically
///
/// The document goes to a temporary file in the same directory, is synced,
/// then renamed over `path`. Readers see either the old file or the complete
/// new one.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CacheError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let bytes = serde_json::to_vec_pretty(value)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;
    Ok(())
}
