//! In-memory unit cache

use crate::CacheError;
use async_trait::async_trait;
use scriptorium_domain::traits::UnitCache;
use scriptorium_domain::{CacheEntry, CacheKey};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Map-backed cache; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored entry
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.entries
            .lock()
            .map(|e| e.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UnitCache for MemoryCache {
    type Error = CacheError;

    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, Self::Error> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn store(&self, entry: &CacheEntry) -> Result<(), Self::Error> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(entry.key(), entry.clone());
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<(), Self::Error> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
