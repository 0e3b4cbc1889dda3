//! Raw and validated per-unit records
//!
//! Raw records mirror the generator output field for field, with every field
//! optional; the gatekeeper turns them into candidates or rejects them.

use crate::{CandidateChain, CandidateThesis, Chapter, Citation, CrossReference, UnitId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A citation as produced by the generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCitation {
    /// Reference text
    #[serde(default)]
    pub reference: Option<String>,
    /// Claimed kind
    #[serde(default)]
    pub citation_type: Option<String>,
    /// Quoted text
    #[serde(default)]
    pub text: Option<String>,
    /// Author
    #[serde(default)]
    pub author: Option<String>,
    /// Work
    #[serde(default)]
    pub work: Option<String>,
    /// Usage context
    #[serde(default)]
    pub context: Option<String>,
}

/// A thesis as produced by the generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawThesis {
    /// Statement (the model's "title")
    #[serde(default)]
    pub statement: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Thesis type
    #[serde(default)]
    pub thesis_type: Option<String>,
    /// Supporting excerpt
    #[serde(default)]
    pub supporting_text: Option<String>,
    /// Reasoning type
    #[serde(default)]
    pub reasoning_type: Option<String>,
    /// Confidence, kept as emitted (number or numeric string)
    #[serde(default)]
    pub confidence: Option<Value>,
    /// Attached citations
    #[serde(default)]
    pub citations: Vec<RawCitation>,
}

/// Everything the generator returned for one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUnitAnalysis {
    /// Candidate theses
    #[serde(default)]
    pub theses: Vec<RawThesis>,
    /// Unit-level citations
    #[serde(default)]
    pub citations: Vec<RawCitation>,
}

/// Validated output of phase 1 for a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAnalysis {
    /// Unit id
    pub unit_id: UnitId,
    /// Unit ordinal
    pub unit_ordinal: usize,
    /// Part index of the unit
    pub part: u32,
    /// Chapter of the unit
    pub chapter: Chapter,
    /// Valid theses in extraction order
    pub theses: Vec<CandidateThesis>,
    /// Valid unit-level citations in extraction order
    pub citations: Vec<Citation>,
}

impl UnitAnalysis {
    /// Turn validated records back into raw form
    ///
    /// Re-validating the result yields the same analysis.
    pub fn to_raw(&self) -> RawUnitAnalysis {
        RawUnitAnalysis {
            theses: self
                .theses
                .iter()
                .map(|t| RawThesis {
                    statement: Some(t.statement.clone()),
                    description: Some(t.description.clone()),
                    thesis_type: Some(
                        serde_json::to_value(t.thesis_type)
                            .ok()
                            .and_then(|v| v.as_str().map(str::to_string))
                            .unwrap_or_default(),
                    ),
                    supporting_text: Some(t.supporting_text.clone()),
                    reasoning_type: Some(
                        serde_json::to_value(t.reasoning_type)
                            .ok()
                            .and_then(|v| v.as_str().map(str::to_string))
                            .unwrap_or_default(),
                    ),
                    confidence: Some(Value::from(t.confidence.value())),
                    citations: t.citations.iter().map(raw_citation).collect(),
                })
                .collect(),
            citations: self.citations.iter().map(raw_citation).collect(),
        }
    }

    /// Total number of citations, unit-level and thesis-level
    pub fn citation_count(&self) -> usize {
        self.citations.len() + self.theses.iter().map(|t| t.citations.len()).sum::<usize>()
    }
}

/// Validated output of the chain phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainAnalysis {
    /// Chains between candidate thesis ids
    pub chains: Vec<CandidateChain>,
    /// Free-text summary of the argument flow
    #[serde(default)]
    pub argument_flow: String,
    /// Chain records that could not be read
    #[serde(default)]
    pub rejected: usize,
}

/// A theme as proposed by the correlation phase
///
/// References and thesis ids are unresolved strings at this point; the
/// synthesizer matches them against the final citation and thesis sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeGroup {
    /// Theme name
    pub theme: String,
    /// What ties the members together
    #[serde(default)]
    pub description: String,
    /// Member references
    #[serde(default)]
    pub references: Vec<String>,
    /// Candidate thesis ids relying on the members
    #[serde(default)]
    pub related_thesis_ids: Vec<String>,
}

/// Validated output of the correlation phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    /// Proposed themes, in model output order
    pub groups: Vec<ThemeGroup>,
    /// Proposed cross references
    #[serde(default)]
    pub cross_references: Vec<CrossReference>,
}

fn raw_citation(citation: &Citation) -> RawCitation {
    RawCitation {
        reference: Some(citation.reference.clone()),
        citation_type: Some(citation.citation_type.to_string()),
        text: citation.text.clone(),
        author: citation.author.clone(),
        work: citation.work.clone(),
        context: citation.context.clone(),
    }
}
