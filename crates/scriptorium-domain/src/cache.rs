//! Cache records shared by the orchestrator and cache backends

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Pipeline phase a cache entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Per-unit thesis and citation extraction
    Extraction,
    /// Global chain extraction
    Chains,
    /// Global citation correlation
    Correlation,
    /// Executive summary over the final theses
    Summary,
}

impl Phase {
    /// Directory-safe name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Extraction => "extraction",
            Phase::Chains => "chains",
            Phase::Correlation => "correlation",
            Phase::Summary => "summary",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a cache entry
///
/// Per-unit phases use the unit id; global phases use a key derived from
/// the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Unit id or global key
    pub unit_id: String,
    /// Phase
    pub phase: Phase,
}

impl CacheKey {
    /// Create a key
    pub fn new(unit_id: impl Into<String>, phase: Phase) -> Self {
        Self {
            unit_id: unit_id.into(),
            phase,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.phase, self.unit_id)
    }
}

/// A cached phase result
///
/// Written once per `(unit_id, phase)`. An entry whose `input_hash` no
/// longer matches its input is stale and gets regenerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unit id or global key
    pub unit_id: String,
    /// Phase
    pub phase: Phase,
    /// Hash of the input the entry was produced from
    pub input_hash: String,
    /// Generator response text, verbatim; empty when no call was made
    pub raw_output: String,
    /// Output after validation
    pub validated_output: Value,
    /// Creation time, seconds since the Unix epoch
    pub created_at: u64,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        key: &CacheKey,
        input_hash: impl Into<String>,
        raw_output: impl Into<String>,
        validated_output: Value,
    ) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            unit_id: key.unit_id.clone(),
            phase: key.phase,
            input_hash: input_hash.into(),
            raw_output: raw_output.into(),
            validated_output,
            created_at,
        }
    }

    /// The key this entry is stored under
    pub fn key(&self) -> CacheKey {
        CacheKey::new(self.unit_id.clone(), self.phase)
    }

    /// Whether the entry was produced from the given input
    pub fn is_fresh(&self, input_hash: &str) -> bool {
        self.input_hash == input_hash
    }
}
