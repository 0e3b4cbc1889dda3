//! Scriptorium Storage Layer
//!
//! Implements the `UnitCache` trait that lets an interrupted run resume
//! without re-issuing completed generation calls.
//!
//! # Architecture
//!
//! - [`FileCache`]: one JSON file per unit per phase under
//!   `<root>/<phase>/<unit_id>.json`, written atomically
//! - [`MemoryCache`]: in-process map for tests and one-shot runs
//!
//! # Examples
//!
//! ```no_run
//! use scriptorium_domain::traits::UnitCache;
//! use scriptorium_domain::{CacheEntry, CacheKey, Phase};
//! use scriptorium_store::FileCache;
//!
//! # async fn example() -> Result<(), scriptorium_store::CacheError> {
//! let cache = FileCache::new(".scriptorium/cache");
//! let key = CacheKey::new("U1", Phase::Extraction);
//! if cache.load(&key).await?.is_none() {
//!     let entry = CacheEntry::new(&key, "hash", "{}", serde_json::json!({}));
//!     cache.store(&entry).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod file;
mod memory;

pub use file::{write_json_atomic, FileCache};
pub use memory::MemoryCache;

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry exists but cannot be trusted
    #[error("Corrupt cache entry {key}: {detail}")]
    Corrupt {
        /// Affected key
        key: String,
        /// What was wrong
        detail: String,
    },

    /// Entry could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// In-memory state lock was poisoned
    #[error("Cache state poisoned")]
    Poisoned,
}

impl CacheError {
    /// Whether the error means the entry should be regenerated
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CacheError::Corrupt { .. })
    }
}
