//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::notes::harvest_notes;
use crate::parser::{
    parse_chain_analysis, parse_correlation, parse_summary, parse_unit_analysis,
};
use crate::prompt::{
    chain_prompt, chain_schema, correlation_prompt, correlation_schema, summary_prompt,
    summary_schema, unit_prompt, unit_schema,
};
use scriptorium_domain::traits::LlmProvider;
use scriptorium_domain::{
    CandidateThesis, ChainAnalysis, Citation, CorrelationAnalysis, RawCitation, RawUnitAnalysis,
    Thesis, Unit, UnitAnalysis,
};
use scriptorium_llm::{GatewayConfig, GenerationGateway};
use std::collections::HashSet;
use tracing::{debug, info};

/// Output of one generation phase
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    /// Response text of the successful attempt, verbatim
    pub raw: String,
    /// Leniently parsed records
    pub parsed: T,
    /// Generation attempts used (0 when no call was needed)
    pub attempts: u32,
}

impl<T> Extraction<T> {
    fn skipped(parsed: T) -> Self {
        Self {
            raw: String::new(),
            parsed,
            attempts: 0,
        }
    }
}

/// The Extractor turns units into raw records through the generation gateway
pub struct Extractor<P: LlmProvider> {
    gateway: GenerationGateway<P>,
    config: ExtractorConfig,
}

impl<P: LlmProvider> Extractor<P> {
    /// Create a new Extractor
    pub fn new(provider: P, gateway_config: GatewayConfig, config: ExtractorConfig) -> Self {
        Self {
            gateway: GenerationGateway::new(provider, gateway_config),
            config,
        }
    }

    /// Borrow the underlying gateway
    pub fn gateway(&self) -> &GenerationGateway<P> {
        &self.gateway
    }

    /// Borrow the configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract candidate theses and citations from one unit
    ///
    /// Blank units produce an empty analysis without calling the generator.
    pub async fn extract_unit(
        &self,
        unit: &Unit,
    ) -> Result<Extraction<RawUnitAnalysis>, ExtractorError> {
        if unit.is_blank() {
            debug!("Unit {} is blank, skipping generation", unit.id);
            return Ok(Extraction::skipped(RawUnitAnalysis::default()));
        }

        let prompt = unit_prompt(unit, self.config.prompt_text_limit);
        debug!("Unit {} prompt length: {} chars", unit.id, prompt.user.len());

        let generated = self.gateway.generate(&prompt, &unit_schema()).await?;
        let mut parsed = parse_unit_analysis(&generated.value);
        merge_harvested(&mut parsed.citations, harvest_notes(unit));

        info!(
            "Unit {} extracted: {} theses, {} citations ({} attempt(s))",
            unit.id,
            parsed.theses.len(),
            parsed.citations.len(),
            generated.attempts
        );

        Ok(Extraction {
            raw: generated.raw,
            parsed,
            attempts: generated.attempts,
        })
    }

    /// Identify logical chains between candidate theses
    ///
    /// Fewer than two theses cannot form a chain, so no call is made.
    pub async fn extract_chains(
        &self,
        theses: &[CandidateThesis],
    ) -> Result<Extraction<ChainAnalysis>, ExtractorError> {
        if theses.len() < 2 {
            debug!("{} thesis(es), skipping chain extraction", theses.len());
            return Ok(Extraction::skipped(ChainAnalysis::default()));
        }

        let prompt = chain_prompt(theses, self.config.chain_excerpt_chars);
        let generated = self.gateway.generate(&prompt, &chain_schema()).await?;
        let parsed = parse_chain_analysis(&generated.value);

        info!(
            "Chain extraction over {} theses: {} chains, {} rejected",
            theses.len(),
            parsed.chains.len(),
            parsed.rejected
        );

        Ok(Extraction {
            raw: generated.raw,
            parsed,
            attempts: generated.attempts,
        })
    }

    /// Group every citation of the run by theme
    ///
    /// Runs without citations skip the call.
    pub async fn correlate_citations(
        &self,
        analyses: &[UnitAnalysis],
    ) -> Result<Extraction<CorrelationAnalysis>, ExtractorError> {
        let citations = collect_citations(analyses);
        if citations.is_empty() {
            debug!("No citations, skipping correlation");
            return Ok(Extraction::skipped(CorrelationAnalysis::default()));
        }

        let theses: Vec<CandidateThesis> = analyses
            .iter()
            .flat_map(|a| a.theses.iter().cloned())
            .collect();
        let prompt = correlation_prompt(&citations, &theses);
        let generated = self.gateway.generate(&prompt, &correlation_schema()).await?;
        let parsed = parse_correlation(&generated.value);

        info!(
            "Correlated {} citations into {} groups",
            citations.len(),
            parsed.groups.len()
        );

        Ok(Extraction {
            raw: generated.raw,
            parsed,
            attempts: generated.attempts,
        })
    }

    /// Write the executive summary over the final theses
    ///
    /// An empty thesis set has nothing to summarize, so no call is made.
    pub async fn summarize(&self, theses: &[Thesis]) -> Result<Extraction<String>, ExtractorError> {
        if theses.is_empty() {
            debug!("No theses, skipping summary");
            return Ok(Extraction::skipped(String::new()));
        }

        let generated = self
            .gateway
            .generate(&summary_prompt(theses), &summary_schema())
            .await?;
        let parsed = parse_summary(&generated.value);
        info!("Summary over {} theses: {} chars", theses.len(), parsed.len());

        Ok(Extraction {
            raw: generated.raw,
            parsed,
            attempts: generated.attempts,
        })
    }
}

/// Every distinct citation across the analyses, in document order
pub fn collect_citations(analyses: &[UnitAnalysis]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    analyses
        .iter()
        .flat_map(|a| {
            a.theses
                .iter()
                .flat_map(|t| t.citations.iter())
                .chain(a.citations.iter())
        })
        .filter(|c| seen.insert(c.key()))
        .cloned()
        .collect()
}

/// Append harvested citations whose reference the generator did not report
fn merge_harvested(citations: &mut Vec<RawCitation>, harvested: Vec<RawCitation>) {
    let mut known: HashSet<String> = citations
        .iter()
        .filter_map(|c| c.reference.as_deref())
        .map(|r| r.trim().to_lowercase())
        .collect();
    for citation in harvested {
        let key = citation.reference.as_deref().unwrap_or_default().to_lowercase();
        if known.insert(key) {
            citations.push(citation);
        }
    }
}
