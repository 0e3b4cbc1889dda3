//! Run report collected while a pipeline run progresses

use crate::UnitOmission;
use scriptorium_domain::{CitationType, KnowledgeBase};
use scriptorium_gatekeeper::Diagnostic;
use scriptorium_synthesizer::SynthesisReport;
use std::collections::BTreeMap;

/// Theses below this confidence are reported as low-confidence
pub const LOW_CONFIDENCE: f64 = 0.7;

/// Shape of the final knowledge base
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityReport {
    /// Final theses
    pub theses: usize,
    /// Final citations per type
    pub citations_by_type: BTreeMap<CitationType, usize>,
    /// Theses with confidence below [`LOW_CONFIDENCE`]
    pub low_confidence: usize,
    /// Chains in the knowledge base
    pub chains: usize,
    /// Citation groups in the knowledge base
    pub citation_groups: usize,
    /// Validator diagnostics per kind
    pub diagnostics_by_kind: BTreeMap<String, usize>,
}

impl QualityReport {
    /// Measure a knowledge base and the diagnostics that led to it
    pub fn measure(knowledge_base: &KnowledgeBase, diagnostics: &[Diagnostic]) -> Self {
        let mut citations_by_type = BTreeMap::new();
        for citation in knowledge_base.citations() {
            *citations_by_type.entry(citation.citation_type).or_insert(0) += 1;
        }
        let mut diagnostics_by_kind = BTreeMap::new();
        for diagnostic in diagnostics {
            *diagnostics_by_kind
                .entry(diagnostic.kind().to_string())
                .or_insert(0) += 1;
        }

        Self {
            theses: knowledge_base.theses().len(),
            citations_by_type,
            low_confidence: knowledge_base
                .theses()
                .iter()
                .filter(|t| t.confidence.value() < LOW_CONFIDENCE)
                .count(),
            chains: knowledge_base.chains().len(),
            citation_groups: knowledge_base.citation_groups().len(),
            diagnostics_by_kind,
        }
    }

    /// Total final citations
    pub fn citations(&self) -> usize {
        self.citations_by_type.values().sum()
    }
}

/// Everything a completed run reports about itself
///
/// Every record that did not make it into the knowledge base is counted
/// here: failed units, dropped records, merged duplicates, dropped chains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Identifier of the run (UUIDv7)
    pub run_id: String,

    /// Units produced by the chunker
    pub units_total: usize,

    /// Units served from the cache
    pub units_from_cache: usize,

    /// Units extracted in this run
    pub units_generated: usize,

    /// Units that failed and were left out
    pub omissions: Vec<UnitOmission>,

    /// Global phases served from the cache
    pub global_phases_from_cache: usize,

    /// The summary call failed and the knowledge base has none
    pub summary_failed: bool,

    /// Generation attempts issued, including retries
    pub generation_attempts: u32,

    /// Cache entries that could not be written
    pub cache_write_failures: usize,

    /// Cache entries that were unreadable, corrupt or stale
    pub cache_entries_discarded: usize,

    /// Validator diagnostics in unit order
    pub diagnostics: Vec<Diagnostic>,

    /// Synthesis counters
    pub synthesis: SynthesisReport,

    /// Shape of the result
    pub quality: QualityReport,

    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Create an empty report for the given run
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    /// Record a failed unit
    pub fn record_omission(&mut self, omission: UnitOmission) {
        self.omissions.push(omission);
    }

    /// Number of units excluded from the global phases
    pub fn excluded_units(&self) -> usize {
        self.omissions.len()
    }

    /// Records dropped by the validator
    pub fn rejected_records(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_rejection()).count()
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pipeline Run Summary".to_string(),
            "====================".to_string(),
            format!("Run: {}", self.run_id),
            format!("Elapsed: {}ms", self.elapsed_ms),
            format!(
                "Units: {} total, {} from cache, {} generated, {} excluded",
                self.units_total,
                self.units_from_cache,
                self.units_generated,
                self.excluded_units()
            ),
            format!("Generation attempts: {}", self.generation_attempts),
            format!("Global phases from cache: {}", self.global_phases_from_cache),
        ];

        if self.summary_failed {
            lines.push("Summary: not produced (generation failed)".to_string());
        }

        if self.cache_entries_discarded > 0 || self.cache_write_failures > 0 {
            lines.push(format!(
                "Cache: {} entries discarded, {} writes failed",
                self.cache_entries_discarded, self.cache_write_failures
            ));
        }

        if !self.omissions.is_empty() {
            lines.push(String::new());
            lines.push("Excluded units:".to_string());
            for omission in &self.omissions {
                lines.push(format!(
                    "  {} after {} attempt(s): {}",
                    omission.unit_id, omission.attempts, omission.reason
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Diagnostics: {} ({} records dropped)",
            self.diagnostics.len(),
            self.rejected_records()
        ));
        for (kind, count) in &self.quality.diagnostics_by_kind {
            lines.push(format!("  {}: {}", kind, count));
        }

        lines.push(String::new());
        lines.push(self.synthesis.summary());

        lines.push(String::new());
        lines.push("Knowledge base:".to_string());
        lines.push(format!(
            "  Theses: {} ({} below {:.1} confidence)",
            self.quality.theses, self.quality.low_confidence, LOW_CONFIDENCE
        ));
        lines.push(format!("  Citations: {}", self.quality.citations()));
        for (citation_type, count) in &self.quality.citations_by_type {
            lines.push(format!("    {}: {}", citation_type, count));
        }
        lines.push(format!("  Chains: {}", self.quality.chains));
        lines.push(format!("  Citation groups: {}", self.quality.citation_groups));

        lines.join("\n")
    }
}
