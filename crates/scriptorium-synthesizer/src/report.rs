//! Counters collected while synthesizing a knowledge base

use crate::ChainResolutionError;

/// What the synthesizer kept, merged and dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisReport {
    /// Candidate theses received
    pub candidates: usize,

    /// Candidates discarded as duplicates of a kept thesis
    pub duplicates_removed: usize,

    /// Final theses
    pub theses: usize,

    /// Final distinct citations
    pub citations: usize,

    /// Chains attached to final theses
    pub chains_resolved: usize,

    /// Chains dropped during resolution
    pub chain_errors: Vec<ChainResolutionError>,

    /// Chains rejected by the parser before synthesis
    pub chains_rejected_by_parser: usize,

    /// Group memberships dropped because the citation already had a theme
    pub group_memberships_dropped: usize,

    /// Group references matching no final citation
    pub unresolved_group_references: usize,

    /// Groups dropped for having no members
    pub empty_groups_dropped: usize,

    /// Group thesis links matching no final thesis
    pub unknown_related_theses: usize,

    /// Cross references dropped entirely
    pub cross_references_dropped: usize,
}

impl SynthesisReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chain resolution failure
    pub fn record_chain_error(&mut self, error: ChainResolutionError) {
        self.chain_errors.push(error);
    }

    /// Chains dropped for any reason
    pub fn chains_dropped(&self) -> usize {
        self.chain_errors.len() + self.chains_rejected_by_parser
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Synthesis Summary".to_string(),
            "=================".to_string(),
            format!("Candidate theses: {}", self.candidates),
            format!("Duplicates removed: {}", self.duplicates_removed),
            format!("Final theses: {}", self.theses),
            format!("Final citations: {}", self.citations),
            format!(
                "Chains: {} resolved, {} dropped",
                self.chains_resolved,
                self.chains_dropped()
            ),
        ];

        let group_losses = self.group_memberships_dropped
            + self.unresolved_group_references
            + self.empty_groups_dropped
            + self.unknown_related_theses;
        if group_losses > 0 || self.cross_references_dropped > 0 {
            lines.push(String::new());
            lines.push("Correlation losses:".to_string());
            lines.push(format!(
                "  Memberships already themed: {}",
                self.group_memberships_dropped
            ));
            lines.push(format!(
                "  Unresolved references: {}",
                self.unresolved_group_references
            ));
            lines.push(format!("  Empty groups: {}", self.empty_groups_dropped));
            lines.push(format!(
                "  Unknown related theses: {}",
                self.unknown_related_theses
            ));
            lines.push(format!(
                "  Cross references dropped: {}",
                self.cross_references_dropped
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_counts() {
        let mut report = SynthesisReport::new();
        report.candidates = 5;
        report.duplicates_removed = 1;
        report.theses = 4;
        report.chains_resolved = 2;
        report.chains_rejected_by_parser = 1;
        report.record_chain_error(ChainResolutionError::UnknownEndpoint {
            from: "U1.T1".to_string(),
            to: "U9.T9".to_string(),
            missing: "U9.T9".to_string(),
        });

        let summary = report.summary();
        assert!(summary.contains("Candidate theses: 5"));
        assert!(summary.contains("Chains: 2 resolved, 2 dropped"));
        assert!(!summary.contains("Correlation losses"));
    }

    #[test]
    fn test_summary_lists_correlation_losses() {
        let report = SynthesisReport {
            empty_groups_dropped: 1,
            ..SynthesisReport::default()
        };
        assert!(report.summary().contains("Empty groups: 1"));
    }
}
