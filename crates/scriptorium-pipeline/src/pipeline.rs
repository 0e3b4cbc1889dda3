//! Phase orchestration
//!
//! Phase 1 runs once per unit, concurrently up to the configured bound, and
//! persists each validated result before the unit counts as done. The chain,
//! correlation, synthesis and summary phases run strictly after every unit
//! has finished, over the surviving units in document order.

use crate::state::UnitTracker;
use crate::{PipelineConfig, PipelineError, QualityReport, RunReport, UnitOmission, UnitState};
use scriptorium_domain::traits::{LlmProvider, UnitCache};
use scriptorium_domain::{
    content_hash, CacheEntry, CacheKey, CandidateThesis, ChainAnalysis, CorrelationAnalysis,
    KnowledgeBase, Phase, Thesis, Unit, UnitAnalysis,
};
use scriptorium_extractor::{Chunker, Extraction, Extractor, ExtractorError, Outline};
use scriptorium_gatekeeper::{ValidatedUnit, Validator};
use scriptorium_llm::Backend;
use scriptorium_store::{write_json_atomic, FileCache};
use scriptorium_synthesizer::Synthesizer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Pseudo-unit prefix under which global phases are cached
const BOOK_PREFIX: &str = "book";

/// A finished run
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The frozen result
    pub knowledge_base: KnowledgeBase,
    /// What the run did and what it left out
    pub report: RunReport,
}

enum UnitOutcome {
    Cached(ValidatedUnit),
    Extracted {
        validated: ValidatedUnit,
        attempts: u32,
        persisted: bool,
    },
    Failed(UnitOmission),
}

struct UnitResult {
    ordinal: usize,
    outcome: UnitOutcome,
    discarded_entry: bool,
}

/// The phase orchestrator
///
/// # Examples
///
/// ```no_run
/// use scriptorium_pipeline::{Pipeline, PipelineConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pipeline = Pipeline::from_config(PipelineConfig::default())?;
///     let text = std::fs::read_to_string("book.txt")?;
///
///     let output = pipeline.run(&text).await?;
///     println!("{}", output.report.summary());
///     Ok(())
/// }
/// ```
pub struct Pipeline<P: LlmProvider + 'static, C: UnitCache + 'static> {
    config: PipelineConfig,
    chunker: Chunker,
    extractor: Arc<Extractor<P>>,
    validator: Validator,
    synthesizer: Synthesizer,
    cache: Arc<C>,
}

impl Pipeline<Backend, FileCache> {
    /// Build a pipeline with the configured backend and an on-disk cache
    /// under `cache_dir`
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let backend = Backend::from_config(&config.backend)?;
        let cache = FileCache::new(config.cache_dir.clone());
        Self::new(backend, cache, config)
    }
}

impl<P: LlmProvider + 'static, C: UnitCache + 'static> Pipeline<P, C> {
    /// Create a new pipeline
    ///
    /// `config.backend` and `config.cache_dir` are ignored here; the
    /// provider and cache are the ones passed in.
    pub fn new(provider: P, cache: C, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            chunker: Chunker::new(config.chunker.clone()),
            extractor: Arc::new(Extractor::new(
                provider,
                config.gateway.clone(),
                config.extractor.clone(),
            )),
            validator: Validator::new(config.validation.clone()),
            synthesizer: Synthesizer::new(config.synthesis.clone()),
            cache: Arc::new(cache),
            config,
        })
    }

    /// Borrow the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Borrow the unit cache
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Run over text, deriving the outline from its headings
    pub async fn run(&self, text: &str) -> Result<RunOutput, PipelineError> {
        let units = self
            .chunker
            .chunk_detected(text)
            .map_err(PipelineError::Chunking)?;
        self.run_units(units).await
    }

    /// Run over text cut along a known outline
    pub async fn run_with_outline(
        &self,
        text: &str,
        outline: &Outline,
    ) -> Result<RunOutput, PipelineError> {
        let units = self
            .chunker
            .chunk(text, outline)
            .map_err(PipelineError::Chunking)?;
        self.run_units(units).await
    }

    /// Run over units that were already chunked
    ///
    /// # Errors
    ///
    /// Unit failures are reported, not returned. An error means no knowledge
    /// base could be built: every unit failed, a global phase failed, or the
    /// result could not be exported. Cached unit results stay valid for the
    /// next run in every case.
    pub async fn run_units(&self, units: Vec<Unit>) -> Result<RunOutput, PipelineError> {
        let run_id = Uuid::now_v7().to_string();
        let span = info_span!("pipeline_run", run_id = %run_id);
        self.execute(run_id, units).instrument(span).await
    }

    async fn execute(&self, run_id: String, units: Vec<Unit>) -> Result<RunOutput, PipelineError> {
        let started = Instant::now();
        let mut report = RunReport::new(run_id);
        report.units_total = units.len();
        info!(
            "Starting run over {} units (concurrency {})",
            units.len(),
            self.config.max_concurrency
        );

        let analyses = self.extract_units(units, &mut report).await?;
        if analyses.is_empty() && report.excluded_units() > 0 {
            error!("All {} units failed extraction", report.excluded_units());
            return Err(PipelineError::NoSurvivingUnits {
                failed: report.excluded_units(),
            });
        }

        let chains = self.extract_chains(&analyses, &mut report).await?;
        let correlation = self.correlate_citations(&analyses, &mut report).await?;

        let synthesis = self
            .synthesizer
            .synthesize(&analyses, &chains, &correlation)?;
        report.synthesis = synthesis.report;
        let summary = self
            .summarize(synthesis.knowledge_base.theses(), &mut report)
            .await?;
        let knowledge_base = synthesis.knowledge_base.with_summary(summary);
        report.quality = QualityReport::measure(&knowledge_base, &report.diagnostics);

        if let Some(path) = &self.config.output_path {
            export(&knowledge_base, path).await?;
        }

        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!("Run complete\n{}", report.summary());

        Ok(RunOutput {
            knowledge_base,
            report,
        })
    }

    /// Phase 1 over every unit; returns surviving analyses in unit order
    async fn extract_units(
        &self,
        units: Vec<Unit>,
        report: &mut RunReport,
    ) -> Result<Vec<UnitAnalysis>, PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = JoinSet::new();

        for unit in units {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Worker(e.to_string()))?;
            let extractor = Arc::clone(&self.extractor);
            let cache = Arc::clone(&self.cache);
            let validator = self.validator.clone();
            tasks.spawn(
                async move {
                    let result = process_unit(&extractor, cache.as_ref(), &validator, unit).await;
                    drop(permit);
                    result
                }
                .in_current_span(),
            );
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| PipelineError::Worker(e.to_string()))??;
            results.push(result);
        }
        results.sort_by_key(|r| r.ordinal);

        let mut analyses = Vec::with_capacity(results.len());
        for result in results {
            if result.discarded_entry {
                report.cache_entries_discarded += 1;
            }
            match result.outcome {
                UnitOutcome::Cached(validated) => {
                    report.units_from_cache += 1;
                    report.diagnostics.extend(validated.diagnostics);
                    analyses.push(validated.analysis);
                }
                UnitOutcome::Extracted {
                    validated,
                    attempts,
                    persisted,
                } => {
                    report.units_generated += 1;
                    report.generation_attempts += attempts;
                    if !persisted {
                        report.cache_write_failures += 1;
                    }
                    report.diagnostics.extend(validated.diagnostics);
                    analyses.push(validated.analysis);
                }
                UnitOutcome::Failed(omission) => {
                    report.generation_attempts += omission.attempts;
                    report.record_omission(omission);
                }
            }
        }

        info!(
            "Extraction phase done: {} from cache, {} generated, {} failed",
            report.units_from_cache,
            report.units_generated,
            report.excluded_units()
        );
        Ok(analyses)
    }

    async fn extract_chains(
        &self,
        analyses: &[UnitAnalysis],
        report: &mut RunReport,
    ) -> Result<ChainAnalysis, PipelineError> {
        let theses: Vec<CandidateThesis> = analyses
            .iter()
            .flat_map(|a| a.theses.iter().cloned())
            .collect();
        let extractor = &self.extractor;
        self.cached_phase(Phase::Chains, theses.as_slice(), report, || {
            extractor.extract_chains(&theses)
        })
        .await
    }

    async fn correlate_citations(
        &self,
        analyses: &[UnitAnalysis],
        report: &mut RunReport,
    ) -> Result<CorrelationAnalysis, PipelineError> {
        let extractor = &self.extractor;
        self.cached_phase(Phase::Correlation, analyses, report, || {
            extractor.correlate_citations(analyses)
        })
        .await
    }

    /// Executive summary over the final theses
    ///
    /// The knowledge base is complete without it, so a failed call leaves
    /// the summary empty and is reported instead of ending the run.
    async fn summarize(
        &self,
        theses: &[Thesis],
        report: &mut RunReport,
    ) -> Result<String, PipelineError> {
        let extractor = &self.extractor;
        match self
            .cached_phase(Phase::Summary, theses, report, || extractor.summarize(theses))
            .await
        {
            Ok(summary) => Ok(summary),
            Err(PipelineError::GlobalPhase { source, .. }) => {
                if let ExtractorError::Generation(e) = &source {
                    report.generation_attempts += e.attempts();
                }
                warn!("Continuing without a summary: {}", source);
                report.summary_failed = true;
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Run a global phase unless its output for this exact input is cached
    ///
    /// The entry lives under `book-<hash>`, where the hash covers the phase
    /// input, so any change upstream misses the cache.
    async fn cached_phase<I, T, F, Fut>(
        &self,
        phase: Phase,
        input: &I,
        report: &mut RunReport,
        generate: F,
    ) -> Result<T, PipelineError>
    where
        I: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Extraction<T>, ExtractorError>>,
    {
        let input_hash = content_hash(&serde_json::to_string(input)?);
        let key = CacheKey::new(format!("{}-{}", BOOK_PREFIX, &input_hash[..16]), phase);

        let discarded = match self.cache.load(&key).await {
            Ok(Some(entry)) if entry.is_fresh(&input_hash) => {
                match serde_json::from_value::<T>(entry.validated_output) {
                    Ok(output) => {
                        info!("Phase {} served from cache ({})", phase, key.unit_id);
                        report.global_phases_from_cache += 1;
                        return Ok(output);
                    }
                    Err(e) => {
                        warn!("Cache entry {} is corrupt, regenerating: {}", key, e);
                        true
                    }
                }
            }
            Ok(Some(_)) => {
                warn!("Cache entry {} is stale, regenerating", key);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Cache entry {} unreadable, regenerating: {}", key, e);
                true
            }
        };
        if discarded {
            report.cache_entries_discarded += 1;
            discard(self.cache.as_ref(), &key).await;
        }

        info!("Starting phase {}", phase);
        let extraction = generate().await.map_err(|source| {
            error!("Phase {} failed: {}", phase, source);
            PipelineError::GlobalPhase { phase, source }
        })?;
        report.generation_attempts += extraction.attempts;

        let entry = CacheEntry::new(
            &key,
            input_hash,
            extraction.raw,
            serde_json::to_value(&extraction.parsed)?,
        );
        if let Err(e) = self.cache.store(&entry).await {
            warn!("Could not cache phase {}: {}", phase, e);
            report.cache_write_failures += 1;
        }
        Ok(extraction.parsed)
    }
}

/// Phase 1 for one unit: cache lookup, generation, validation, persistence
async fn process_unit<P: LlmProvider, C: UnitCache>(
    extractor: &Extractor<P>,
    cache: &C,
    validator: &Validator,
    unit: Unit,
) -> Result<UnitResult, PipelineError> {
    let mut tracker = UnitTracker::new(unit.id.clone());
    let key = CacheKey::new(unit.id.as_str(), Phase::Extraction);
    let input_hash = unit.content_hash();

    let discarded_entry = match cache.load(&key).await {
        Ok(Some(entry)) if entry.is_fresh(&input_hash) => {
            match serde_json::from_value::<ValidatedUnit>(entry.validated_output) {
                Ok(validated) => {
                    tracker.advance(UnitState::Cached)?;
                    return Ok(UnitResult {
                        ordinal: unit.ordinal,
                        outcome: UnitOutcome::Cached(validated),
                        discarded_entry: false,
                    });
                }
                Err(e) => {
                    warn!("Cache entry {} is corrupt, regenerating: {}", key, e);
                    true
                }
            }
        }
        Ok(Some(_)) => {
            warn!("Cache entry {} no longer matches the unit text, regenerating", key);
            true
        }
        Ok(None) => false,
        Err(e) => {
            warn!("Cache entry {} unreadable, regenerating: {}", key, e);
            true
        }
    };
    if discarded_entry {
        discard(cache, &key).await;
    }

    tracker.advance(UnitState::Generating)?;
    let extraction = match extractor.extract_unit(&unit).await {
        Ok(extraction) => extraction,
        Err(e) => {
            tracker.advance(UnitState::Failed)?;
            let attempts = match &e {
                ExtractorError::Generation(g) => g.attempts(),
                _ => 0,
            };
            error!("Unit {} failed after {} attempt(s): {}", unit.id, attempts, e);
            return Ok(UnitResult {
                ordinal: unit.ordinal,
                outcome: UnitOutcome::Failed(UnitOmission {
                    unit_id: unit.id.clone(),
                    ordinal: unit.ordinal,
                    attempts,
                    reason: e.to_string(),
                }),
                discarded_entry,
            });
        }
    };

    tracker.advance(UnitState::Validating)?;
    let validated = validator.validate(&unit, &extraction.parsed);
    if !validated.diagnostics.is_empty() {
        debug!(
            "Unit {}: {} diagnostic(s), {} record(s) dropped",
            unit.id,
            validated.diagnostics.len(),
            validated.rejected()
        );
    }

    let entry = CacheEntry::new(
        &key,
        input_hash,
        extraction.raw,
        serde_json::to_value(&validated)?,
    );
    let persisted = match cache.store(&entry).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not cache unit {}, it will be regenerated next run: {}", unit.id, e);
            false
        }
    };
    tracker.advance(UnitState::Cached)?;

    Ok(UnitResult {
        ordinal: unit.ordinal,
        outcome: UnitOutcome::Extracted {
            validated,
            attempts: extraction.attempts,
            persisted,
        },
        discarded_entry,
    })
}

async fn discard<C: UnitCache>(cache: &C, key: &CacheKey) {
    if let Err(e) = cache.remove(key).await {
        warn!("Could not remove cache entry {}: {}", key, e);
    }
}

async fn export(knowledge_base: &KnowledgeBase, path: &Path) -> Result<(), PipelineError> {
    let target = path.to_path_buf();
    let snapshot = knowledge_base.clone();
    tokio::task::spawn_blocking(move || write_json_atomic(&target, &snapshot))
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))??;
    info!("Knowledge base written to {}", path.display());
    Ok(())
}
