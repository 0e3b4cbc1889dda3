//! Knowledge base - the frozen output of a run

use crate::{Chain, Citation, CitationGroup, CrossReference, Thesis, ThesisId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The final, immutable artifact of a pipeline run
///
/// Built once by the synthesizer. Nothing mutates it afterwards; consumers
/// only read through the accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    theses: Vec<Thesis>,
    citations: Vec<Citation>,
    chains: Vec<Chain>,
    citation_groups: Vec<CitationGroup>,
    #[serde(default)]
    cross_references: Vec<CrossReference>,
    #[serde(default)]
    argument_flow: String,
    #[serde(default)]
    summary: String,
}

impl KnowledgeBase {
    /// Freeze a knowledge base from its parts
    pub fn new(
        theses: Vec<Thesis>,
        citations: Vec<Citation>,
        chains: Vec<Chain>,
        citation_groups: Vec<CitationGroup>,
        cross_references: Vec<CrossReference>,
        argument_flow: String,
    ) -> Self {
        Self {
            theses,
            citations,
            chains,
            citation_groups,
            cross_references,
            argument_flow,
            summary: String::new(),
        }
    }

    /// Attach the executive summary, written once the theses are final
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Theses in id order
    pub fn theses(&self) -> &[Thesis] {
        &self.theses
    }

    /// Distinct citations in first-appearance order
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Resolved chains
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Citation groups
    pub fn citation_groups(&self) -> &[CitationGroup] {
        &self.citation_groups
    }

    /// Cross references between citations
    pub fn cross_references(&self) -> &[CrossReference] {
        &self.cross_references
    }

    /// Free-text summary of the argument flow
    pub fn argument_flow(&self) -> &str {
        &self.argument_flow
    }

    /// Executive summary of the book's central argument, empty when none
    /// could be produced
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Look up a thesis by id
    pub fn thesis(&self, id: &ThesisId) -> Option<&Thesis> {
        self.theses.iter().find(|t| &t.id == id)
    }

    /// Check that every cross-entity reference resolves
    ///
    /// Returns the list of problems found; an empty list means the base is
    /// consistent.
    pub fn integrity_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut ids = HashSet::new();
        for thesis in &self.theses {
            if !ids.insert(thesis.id) {
                problems.push(format!("duplicate thesis id {}", thesis.id));
            }
        }

        for chain in &self.chains {
            if !ids.contains(&chain.from_claim_id) {
                problems.push(format!("chain source {} does not resolve", chain.from_claim_id));
            }
            if !ids.contains(&chain.to_claim_id) {
                problems.push(format!("chain target {} does not resolve", chain.to_claim_id));
            }
        }

        let mut grouped = HashSet::new();
        for group in &self.citation_groups {
            for member in &group.members {
                if !grouped.insert(member.key()) {
                    problems.push(format!(
                        "citation {} appears in more than one group",
                        member.reference
                    ));
                }
            }
            for id in &group.related_thesis_ids {
                if !ids.contains(id) {
                    problems.push(format!(
                        "group '{}' relates unknown thesis {}",
                        group.theme, id
                    ));
                }
            }
        }

        problems
    }
}
