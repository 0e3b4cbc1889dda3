//! Chain module - directed logical relations between theses
//!
//! Chains are pairwise only. They are created after final thesis ids exist
//! and never mutated afterwards.

use crate::{Confidence, ReasoningType, ThesisId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of relation between two theses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The source supports or evidences the target
    Supports,
    /// The target is logically derived from the source
    DerivesFrom,
    /// The target elaborates on the source
    Elaborates,
    /// The source is a logical prerequisite of the target
    Precedes,
    /// The two theses are in tension
    Contradicts,
}

impl Relation {
    /// Wire name of the relation
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Supports => "supports",
            Relation::DerivesFrom => "derives_from",
            Relation::Elaborates => "elaborates",
            Relation::Precedes => "precedes",
            Relation::Contradicts => "contradicts",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "supports" => Ok(Relation::Supports),
            "derives_from" => Ok(Relation::DerivesFrom),
            "elaborates" => Ok(Relation::Elaborates),
            "precedes" => Ok(Relation::Precedes),
            "contradicts" => Ok(Relation::Contradicts),
            other => Err(format!("Unknown relation '{}'", other)),
        }
    }
}

/// A chain as extracted, between candidate (local) thesis ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateChain {
    /// Local id of the source thesis
    pub from: String,

    /// Local id of the target thesis
    pub to: String,

    /// Type of relation
    pub relation: Relation,

    /// Kind of inference
    pub reasoning_type: ReasoningType,

    /// Short explanation
    pub explanation: String,

    /// Strength of the relation
    pub strength: Confidence,
}

/// A chain in the final knowledge base
///
/// Both endpoints always resolve to final thesis ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    /// Source thesis
    pub from_claim_id: ThesisId,

    /// Target thesis
    pub to_claim_id: ThesisId,

    /// Type of relation
    pub relation: Relation,

    /// Kind of inference
    pub reasoning_type: ReasoningType,

    /// Short explanation
    pub explanation: String,

    /// Strength of the relation
    pub strength: Confidence,
}
