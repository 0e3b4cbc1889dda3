//! Global deduplication, id assignment and cross-reference resolution

use crate::{ChainResolutionError, SynthesisConfig, SynthesisError, SynthesisReport};
use scriptorium_domain::{
    CandidateThesis, Chain, ChainAnalysis, Chapter, Citation, CitationGroup, CorrelationAnalysis,
    CrossReference, KnowledgeBase, Relation, Thesis, ThesisId, UnitAnalysis,
};
use scriptorium_gatekeeper::bible;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// A knowledge base together with what it cost to build
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// The frozen result
    pub knowledge_base: KnowledgeBase,
    /// Counters and dropped records
    pub report: SynthesisReport,
}

/// Candidates sharing a supporting text within one chapter
struct DuplicateGroup {
    key: DedupKey,
    members: Vec<usize>,
}

/// What two supporting texts are compared by
///
/// Texts without any alphanumeric content normalize to nothing; they are
/// compared by their trimmed raw form instead.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DedupKey {
    Normalized(String),
    Symbolic(String),
}

impl DedupKey {
    fn of(text: &str) -> Self {
        let normalized = normalize(text);
        if normalized.is_empty() {
            DedupKey::Symbolic(text.trim().to_string())
        } else {
            DedupKey::Normalized(normalized)
        }
    }
}

/// Merges per-unit candidates into the final knowledge base
///
/// # Examples
///
/// ```no_run
/// use scriptorium_synthesizer::{SynthesisConfig, Synthesizer};
/// use scriptorium_domain::{ChainAnalysis, CorrelationAnalysis};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let synthesizer = Synthesizer::new(SynthesisConfig::default());
/// let synthesis = synthesizer.synthesize(
///     &[],
///     &ChainAnalysis::default(),
///     &CorrelationAnalysis::default(),
/// )?;
/// println!("{}", synthesis.report.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthesisConfig,
}

impl Synthesizer {
    /// Create a new Synthesizer
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Borrow the configuration
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Build the knowledge base
    ///
    /// `analyses` may arrive in any order; they are processed in unit
    /// sequence so the same inputs always yield the same ids.
    pub fn synthesize(
        &self,
        analyses: &[UnitAnalysis],
        chains: &ChainAnalysis,
        correlation: &CorrelationAnalysis,
    ) -> Result<Synthesis, SynthesisError> {
        self.config.validate().map_err(SynthesisError::Config)?;

        let mut ordered: Vec<&UnitAnalysis> = analyses.iter().collect();
        ordered.sort_by_key(|a| a.unit_ordinal);

        let mut report = SynthesisReport::new();
        let candidates: Vec<&CandidateThesis> =
            ordered.iter().flat_map(|a| a.theses.iter()).collect();
        report.candidates = candidates.len();

        let (theses, id_map) = self.deduplicate(&candidates);
        report.duplicates_removed = candidates.len() - theses.len();
        report.theses = theses.len();

        let citations = collect_citations(&theses, &ordered);
        report.citations = citations.len();

        let final_ids: HashSet<ThesisId> = theses.iter().map(|t| t.id).collect();
        let resolved_chains = resolve_chains(chains, &id_map, &mut report);
        report.chains_resolved = resolved_chains.len();

        let citation_groups =
            resolve_groups(correlation, &citations, &id_map, &final_ids, &mut report);
        let cross_references = resolve_cross_references(correlation, &citations, &mut report);

        let knowledge_base = KnowledgeBase::new(
            theses,
            citations,
            resolved_chains,
            citation_groups,
            cross_references,
            chains.argument_flow.trim().to_string(),
        );

        let problems = knowledge_base.integrity_problems();
        if !problems.is_empty() {
            return Err(SynthesisError::Integrity(problems));
        }

        info!(
            "Synthesized {} theses from {} candidates ({} duplicates), {} citations, {} chains",
            report.theses,
            report.candidates,
            report.duplicates_removed,
            report.citations,
            report.chains_resolved
        );

        Ok(Synthesis {
            knowledge_base,
            report,
        })
    }

    /// Collapse duplicates per chapter and assign final ids
    ///
    /// Returns the surviving theses in unit order and the mapping from every
    /// candidate's local id to the final id of its surviving representative.
    fn deduplicate(
        &self,
        candidates: &[&CandidateThesis],
    ) -> (Vec<Thesis>, HashMap<String, ThesisId>) {
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut by_chapter: HashMap<(u32, Chapter), Vec<usize>> = HashMap::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let key = DedupKey::of(&candidate.supporting_text);
            let chapter_groups = by_chapter
                .entry((candidate.part, candidate.chapter))
                .or_default();
            let found = chapter_groups
                .iter()
                .copied()
                .find(|&g| self.is_duplicate(&groups[g].key, &key));

            match found {
                Some(g) => {
                    debug!(
                        "{} duplicates {}",
                        candidate.id, candidates[groups[g].members[0]].id
                    );
                    groups[g].members.push(index);
                }
                None => {
                    chapter_groups.push(groups.len());
                    groups.push(DuplicateGroup {
                        key,
                        members: vec![index],
                    });
                }
            }
        }

        // Higher confidence wins; ties go to the earlier candidate
        let mut winners: Vec<(usize, &DuplicateGroup)> = groups
            .iter()
            .map(|group| {
                let winner = group
                    .members
                    .iter()
                    .copied()
                    .max_by(|&a, &b| {
                        candidates[a]
                            .confidence
                            .value()
                            .total_cmp(&candidates[b].confidence.value())
                            .then(b.cmp(&a))
                    })
                    .unwrap_or(group.members[0]);
                (winner, group)
            })
            .collect();
        winners.sort_by_key(|(winner, _)| *winner);

        let mut counters: HashMap<(u32, Chapter), u32> = HashMap::new();
        let mut theses = Vec::with_capacity(winners.len());
        let mut id_map = HashMap::new();

        for (winner, group) in winners {
            let candidate = candidates[winner];
            let counter = counters
                .entry((candidate.part, candidate.chapter))
                .or_insert(0);
            *counter += 1;
            let id = ThesisId::new(candidate.part, candidate.chapter, *counter);

            let mut thesis = Thesis::from_candidate(id, candidate.clone());
            for &member in &group.members {
                id_map.insert(candidates[member].id.clone(), id);
                if member != winner {
                    merge_citations(&mut thesis.citations, &candidates[member].citations);
                }
            }
            theses.push(thesis);
        }

        (theses, id_map)
    }

    fn is_duplicate(&self, a: &DedupKey, b: &DedupKey) -> bool {
        match (a, b) {
            (DedupKey::Normalized(a), DedupKey::Normalized(b)) => {
                a == b
                    || (self.config.is_fuzzy()
                        && similarity(a, b) >= self.config.similarity_threshold)
            }
            (DedupKey::Symbolic(a), DedupKey::Symbolic(b)) => !a.is_empty() && a == b,
            _ => false,
        }
    }
}

/// Character-level similarity ratio in [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    f64::from(similar::TextDiff::from_chars(a, b).ratio())
}

/// Lowercased alphanumeric words joined by single spaces
pub fn normalize(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn merge_citations(into: &mut Vec<Citation>, from: &[Citation]) {
    for citation in from {
        if !into.iter().any(|c| c.key() == citation.key()) {
            into.push(citation.clone());
        }
    }
}

/// Distinct citations in document order: thesis citations, then unit-level ones
fn collect_citations(theses: &[Thesis], analyses: &[&UnitAnalysis]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut citations = Vec::new();
    for analysis in analyses {
        let thesis_citations = theses
            .iter()
            .filter(|t| t.source_unit == analysis.unit_id)
            .flat_map(|t| t.citations.iter());
        for citation in thesis_citations.chain(analysis.citations.iter()) {
            if seen.insert(citation.key()) {
                citations.push(citation.clone());
            }
        }
    }
    citations
}

fn resolve_chains(
    analysis: &ChainAnalysis,
    id_map: &HashMap<String, ThesisId>,
    report: &mut SynthesisReport,
) -> Vec<Chain> {
    report.chains_rejected_by_parser = analysis.rejected;

    let mut seen: HashSet<(ThesisId, ThesisId, Relation)> = HashSet::new();
    let mut chains = Vec::new();

    for candidate in &analysis.chains {
        let lookup = |id: &str| {
            id_map
                .get(id)
                .copied()
                .or_else(|| id.parse::<ThesisId>().ok().filter(|t| id_map.values().any(|v| v == t)))
        };

        let resolved = match (lookup(&candidate.from), lookup(&candidate.to)) {
            (Some(from), Some(to)) if from == to => Err(ChainResolutionError::SelfLoop {
                from: candidate.from.clone(),
                to: candidate.to.clone(),
                thesis: from.to_string(),
            }),
            (Some(from), Some(to)) => {
                if seen.insert((from, to, candidate.relation)) {
                    Ok(Chain {
                        from_claim_id: from,
                        to_claim_id: to,
                        relation: candidate.relation,
                        reasoning_type: candidate.reasoning_type,
                        explanation: candidate.explanation.clone(),
                        strength: candidate.strength,
                    })
                } else {
                    Err(ChainResolutionError::Duplicate {
                        from: candidate.from.clone(),
                        to: candidate.to.clone(),
                        relation: candidate.relation,
                    })
                }
            }
            (from, _) => Err(ChainResolutionError::UnknownEndpoint {
                from: candidate.from.clone(),
                to: candidate.to.clone(),
                missing: if from.is_none() {
                    candidate.from.clone()
                } else {
                    candidate.to.clone()
                },
            }),
        };

        match resolved {
            Ok(chain) => chains.push(chain),
            Err(error) => {
                warn!("Dropping chain: {}", error);
                report.record_chain_error(error);
            }
        }
    }
    chains
}

/// Lookup from a generated reference string to a final citation
struct CitationIndex<'a> {
    citations: &'a [Citation],
    by_reference: HashMap<String, usize>,
}

impl<'a> CitationIndex<'a> {
    fn new(citations: &'a [Citation]) -> Self {
        let mut by_reference = HashMap::new();
        for (index, citation) in citations.iter().enumerate() {
            by_reference
                .entry(citation.reference.to_lowercase())
                .or_insert(index);
        }
        Self {
            citations,
            by_reference,
        }
    }

    fn find(&self, reference: &str) -> Option<usize> {
        let reference = reference.trim();
        self.by_reference
            .get(&reference.to_lowercase())
            .or_else(|| {
                bible::normalize(reference)
                    .and_then(|canonical| self.by_reference.get(&canonical.to_lowercase()))
            })
            .copied()
    }

    fn get(&self, index: usize) -> &'a Citation {
        &self.citations[index]
    }
}

fn resolve_groups(
    correlation: &CorrelationAnalysis,
    citations: &[Citation],
    id_map: &HashMap<String, ThesisId>,
    final_ids: &HashSet<ThesisId>,
    report: &mut SynthesisReport,
) -> Vec<CitationGroup> {
    let index = CitationIndex::new(citations);
    let mut themed: HashSet<usize> = HashSet::new();
    let mut groups = Vec::new();

    for group in &correlation.groups {
        let mut members = Vec::new();
        for reference in &group.references {
            match index.find(reference) {
                Some(i) if themed.insert(i) => members.push(index.get(i).clone()),
                Some(_) => {
                    debug!("'{}' already has a theme, skipping in '{}'", reference, group.theme);
                    report.group_memberships_dropped += 1;
                }
                None => report.unresolved_group_references += 1,
            }
        }

        if members.is_empty() {
            debug!("Dropping empty citation group '{}'", group.theme);
            report.empty_groups_dropped += 1;
            continue;
        }

        let mut related_thesis_ids: Vec<ThesisId> = Vec::new();
        for id in &group.related_thesis_ids {
            let resolved = id_map.get(id.trim()).copied().or_else(|| {
                id.trim()
                    .parse::<ThesisId>()
                    .ok()
                    .filter(|t| final_ids.contains(t))
            });
            match resolved {
                Some(id) if !related_thesis_ids.contains(&id) => related_thesis_ids.push(id),
                Some(_) => {}
                None => report.unknown_related_theses += 1,
            }
        }

        groups.push(CitationGroup {
            theme: group.theme.trim().to_string(),
            description: group.description.clone(),
            members,
            related_thesis_ids,
        });
    }
    groups
}

fn resolve_cross_references(
    correlation: &CorrelationAnalysis,
    citations: &[Citation],
    report: &mut SynthesisReport,
) -> Vec<CrossReference> {
    let index = CitationIndex::new(citations);
    let mut resolved = Vec::new();

    for cross in &correlation.cross_references {
        let Some(primary) = index.find(&cross.primary) else {
            report.cross_references_dropped += 1;
            continue;
        };
        let mut related: Vec<String> = Vec::new();
        for reference in &cross.related {
            if let Some(i) = index.find(reference).filter(|&i| i != primary) {
                let reference = index.get(i).reference.clone();
                if !related.contains(&reference) {
                    related.push(reference);
                }
            }
        }
        if related.is_empty() {
            report.cross_references_dropped += 1;
            continue;
        }
        resolved.push(CrossReference {
            primary: index.get(primary).reference.clone(),
            related,
            connection: cross.connection.clone(),
        });
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_domain::{
        CandidateChain, CitationType, Confidence, ReasoningType, ThemeGroup, ThesisType, UnitId,
    };

    fn candidate(
        unit: usize,
        position: usize,
        chapter: u32,
        supporting: &str,
        confidence: f64,
    ) -> CandidateThesis {
        let unit_id = UnitId::from_ordinal(unit);
        CandidateThesis {
            id: CandidateThesis::local_id(&unit_id, position),
            unit_id,
            unit_ordinal: unit,
            part: 1,
            chapter: Chapter::Numbered(chapter),
            statement: format!("Statement {}.{}", unit, position),
            description: String::new(),
            thesis_type: ThesisType::Main,
            supporting_text: supporting.to_string(),
            reasoning_type: ReasoningType::Deductive,
            confidence: Confidence::new(confidence),
            citations: vec![],
        }
    }

    fn analysis(unit: usize, chapter: u32, theses: Vec<CandidateThesis>) -> UnitAnalysis {
        UnitAnalysis {
            unit_id: UnitId::from_ordinal(unit),
            unit_ordinal: unit,
            part: 1,
            chapter: Chapter::Numbered(chapter),
            theses,
            citations: vec![],
        }
    }

    fn chain(from: &str, to: &str) -> CandidateChain {
        CandidateChain {
            from: from.to_string(),
            to: to.to_string(),
            relation: Relation::Supports,
            reasoning_type: ReasoningType::Deductive,
            explanation: String::new(),
            strength: Confidence::new(0.7),
        }
    }

    fn id(chapter: u32, index: u32) -> ThesisId {
        ThesisId::new(1, Chapter::Numbered(chapter), index)
    }

    fn synthesize(analyses: &[UnitAnalysis], chains: ChainAnalysis) -> Synthesis {
        Synthesizer::default()
            .synthesize(analyses, &chains, &CorrelationAnalysis::default())
            .unwrap()
    }

    #[test]
    fn test_duplicate_keeps_higher_confidence() {
        let analyses = vec![
            analysis(1, 5, vec![candidate(1, 1, 5, "X", 0.7)]),
            analysis(2, 5, vec![candidate(2, 1, 5, "X", 0.9)]),
        ];

        let synthesis = synthesize(&analyses, ChainAnalysis::default());
        let theses = synthesis.knowledge_base.theses();
        assert_eq!(theses.len(), 1);
        assert_eq!(theses[0].confidence.value(), 0.9);
        assert_eq!(theses[0].source_unit, UnitId::from_ordinal(2));
        assert_eq!(theses[0].id, id(5, 1));
        assert_eq!(synthesis.report.duplicates_removed, 1);
    }

    #[test]
    fn test_symbol_only_duplicates_are_merged() {
        let analyses = vec![analysis(
            1,
            5,
            vec![
                candidate(1, 1, 5, "— —", 0.9),
                candidate(1, 2, 5, " — — ", 0.7),
                candidate(1, 3, 5, "* * *", 0.8),
            ],
        )];

        let synthesis = synthesize(&analyses, ChainAnalysis::default());
        let theses = synthesis.knowledge_base.theses();
        assert_eq!(theses.len(), 2);
        assert_eq!(theses[0].supporting_text, "— —");
        assert_eq!(theses[0].confidence.value(), 0.9);
        assert_eq!(theses[1].supporting_text, "* * *");
        assert_eq!(synthesis.report.duplicates_removed, 1);
    }

    #[test]
    fn test_tie_goes_to_earlier_unit() {
        let analyses = vec![
            analysis(1, 2, vec![candidate(1, 1, 2, "Same quote.", 0.8)]),
            analysis(2, 2, vec![candidate(2, 1, 2, "same   QUOTE", 0.8)]),
        ];

        let synthesis = synthesize(&analyses, ChainAnalysis::default());
        let theses = synthesis.knowledge_base.theses();
        assert_eq!(theses.len(), 1);
        assert_eq!(theses[0].source_unit, UnitId::from_ordinal(1));
    }

    #[test]
    fn test_same_text_in_other_chapter_is_kept() {
        let analyses = vec![
            analysis(1, 1, vec![candidate(1, 1, 1, "X", 0.9)]),
            analysis(2, 2, vec![candidate(2, 1, 2, "X", 0.9)]),
        ];

        let synthesis = synthesize(&analyses, ChainAnalysis::default());
        assert_eq!(synthesis.knowledge_base.theses().len(), 2);
    }

    #[test]
    fn test_ids_follow_unit_order_per_chapter() {
        // Deliberately out of order
        let analyses = vec![
            analysis(3, 2, vec![candidate(3, 1, 2, "c", 0.8)]),
            analysis(1, 1, vec![candidate(1, 1, 1, "a", 0.8), candidate(1, 2, 1, "b", 0.8)]),
            analysis(2, 1, vec![candidate(2, 1, 1, "d", 0.8)]),
        ];

        let synthesis = synthesize(&analyses, ChainAnalysis::default());
        let ids: Vec<String> = synthesis
            .knowledge_base
            .theses()
            .iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, vec!["1.1.1", "1.1.2", "1.1.3", "1.2.1"]);
    }

    #[test]
    fn test_later_winner_takes_its_own_position() {
        let analyses = vec![
            analysis(1, 1, vec![candidate(1, 1, 1, "dup", 0.5), candidate(1, 2, 1, "other", 0.8)]),
            analysis(2, 1, vec![candidate(2, 1, 1, "dup", 0.9)]),
        ];

        let synthesis = synthesize(&analyses, ChainAnalysis::default());
        let theses = synthesis.knowledge_base.theses();
        assert_eq!(theses[0].supporting_text, "other");
        assert_eq!(theses[0].id, id(1, 1));
        assert_eq!(theses[1].supporting_text, "dup");
        assert_eq!(theses[1].id, id(1, 2));
    }

    #[test]
    fn test_chains_resolve_through_duplicates() {
        let analyses = vec![
            analysis(1, 1, vec![candidate(1, 1, 1, "a", 0.9), candidate(1, 2, 1, "b", 0.6)]),
            analysis(2, 1, vec![candidate(2, 1, 1, "b", 0.8)]),
            analysis(3, 2, vec![candidate(3, 1, 2, "c", 0.8)]),
        ];
        let chains = ChainAnalysis {
            chains: vec![
                chain("U1.T1", "U1.T2"),
                chain("U2.T1", "U3.T1"),
                chain("U1.T2", "U2.T1"),
                chain("U1.T1", "U9.T1"),
                chain("U1.T1", "U2.T1"),
                chain("1.2.1", "U1.T1"),
            ],
            argument_flow: " From a to c. ".to_string(),
            rejected: 1,
        };

        let synthesis = synthesize(&analyses, chains);
        let kb = &synthesis.knowledge_base;
        let resolved: Vec<(String, String)> = kb
            .chains()
            .iter()
            .map(|c| (c.from_claim_id.to_string(), c.to_claim_id.to_string()))
            .collect();
        assert_eq!(
            resolved,
            vec![
                ("1.1.1".to_string(), "1.1.2".to_string()),
                ("1.1.2".to_string(), "1.2.1".to_string()),
                ("1.2.1".to_string(), "1.1.1".to_string()),
            ]
        );
        assert_eq!(kb.argument_flow(), "From a to c.");

        let report = &synthesis.report;
        assert_eq!(report.chains_resolved, 3);
        assert!(matches!(report.chain_errors[0], ChainResolutionError::SelfLoop { .. }));
        assert!(matches!(
            report.chain_errors[1],
            ChainResolutionError::UnknownEndpoint { ref missing, .. } if missing == "U9.T1"
        ));
        assert!(matches!(report.chain_errors[2], ChainResolutionError::Duplicate { .. }));
        assert_eq!(report.chains_dropped(), 4);

        for chain in kb.chains() {
            assert!(kb.thesis(&chain.from_claim_id).is_some());
            assert!(kb.thesis(&chain.to_claim_id).is_some());
        }
    }

    #[test]
    fn test_fuzzy_threshold() {
        let analyses = vec![
            analysis(1, 1, vec![candidate(1, 1, 1, "For God so loved the world", 0.8)]),
            analysis(2, 1, vec![candidate(2, 1, 1, "For God so loved the world.", 0.8)]),
            analysis(3, 1, vec![candidate(3, 1, 1, "For God so loved this world", 0.8)]),
        ];

        let exact = synthesize(&analyses, ChainAnalysis::default());
        assert_eq!(exact.knowledge_base.theses().len(), 2);

        let fuzzy = Synthesizer::new(SynthesisConfig::fuzzy())
            .synthesize(&analyses, &ChainAnalysis::default(), &CorrelationAnalysis::default())
            .unwrap();
        assert_eq!(fuzzy.knowledge_base.theses().len(), 1);
    }

    #[test]
    fn test_citations_merge_and_deduplicate() {
        let jo = Citation::new("Jo 3:16", CitationType::Biblical);
        let rm = Citation::new("Rm 5:8", CitationType::Biblical);
        let note = Citation::new("4", CitationType::Footnote);

        let mut first = candidate(1, 1, 1, "X", 0.9);
        first.citations = vec![jo.clone()];
        let mut second = candidate(2, 1, 1, "X", 0.5);
        second.citations = vec![rm.clone(), jo.clone()];
        let mut unit_two = analysis(2, 1, vec![second]);
        unit_two.citations = vec![note.clone(), jo.clone()];

        let synthesis = synthesize(
            &[analysis(1, 1, vec![first]), unit_two],
            ChainAnalysis::default(),
        );
        let kb = &synthesis.knowledge_base;
        assert_eq!(kb.theses()[0].citations, vec![jo.clone(), rm.clone()]);
        assert_eq!(kb.citations(), &[jo, rm, note]);
    }

    #[test]
    fn test_groups_and_cross_references_resolve() {
        let jo = Citation::new("Jo 3:16", CitationType::Biblical);
        let rm = Citation::new("Rm 5:8", CitationType::Biblical);
        let mut thesis = candidate(1, 1, 1, "X", 0.9);
        thesis.citations = vec![jo, rm];
        let analyses = vec![analysis(1, 1, vec![thesis])];

        let correlation = CorrelationAnalysis {
            groups: vec![
                ThemeGroup {
                    theme: "Soteriology".to_string(),
                    description: "Salvation".to_string(),
                    references: vec!["John 3.16".to_string(), "Ef 2:8".to_string()],
                    related_thesis_ids: vec!["U1.T1".to_string(), "U7.T7".to_string()],
                },
                ThemeGroup {
                    theme: "Love".to_string(),
                    description: String::new(),
                    references: vec!["jo 3:16".to_string(), "Rm 5:8".to_string()],
                    related_thesis_ids: vec!["1.1.1".to_string()],
                },
                ThemeGroup {
                    theme: "Empty".to_string(),
                    description: String::new(),
                    references: vec!["Jo 3:16".to_string()],
                    related_thesis_ids: vec![],
                },
            ],
            cross_references: vec![
                CrossReference {
                    primary: "Jo 3:16".to_string(),
                    related: vec!["Romans 5:8".to_string(), "Tg 1:1".to_string()],
                    connection: "love".to_string(),
                },
                CrossReference {
                    primary: "Gn 1:1".to_string(),
                    related: vec!["Jo 3:16".to_string()],
                    connection: String::new(),
                },
            ],
        };

        let synthesis = Synthesizer::default()
            .synthesize(&analyses, &ChainAnalysis::default(), &correlation)
            .unwrap();
        let kb = &synthesis.knowledge_base;

        let groups = kb.citation_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].theme, "Soteriology");
        assert_eq!(groups[0].members[0].reference, "Jo 3:16");
        assert_eq!(groups[0].related_thesis_ids, vec![id(1, 1)]);
        assert_eq!(groups[1].members.len(), 1);
        assert_eq!(groups[1].members[0].reference, "Rm 5:8");
        assert_eq!(groups[1].related_thesis_ids, vec![id(1, 1)]);

        assert_eq!(kb.cross_references().len(), 1);
        assert_eq!(kb.cross_references()[0].related, vec!["Rm 5:8"]);

        let report = &synthesis.report;
        assert_eq!(report.unresolved_group_references, 1);
        assert_eq!(report.group_memberships_dropped, 2);
        assert_eq!(report.empty_groups_dropped, 1);
        assert_eq!(report.unknown_related_theses, 1);
        assert_eq!(report.cross_references_dropped, 1);
        assert!(kb.integrity_problems().is_empty());
    }

    #[test]
    fn test_empty_input() {
        let synthesis = synthesize(&[], ChainAnalysis::default());
        assert!(synthesis.knowledge_base.theses().is_empty());
        assert_eq!(synthesis.report.candidates, 0);
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let analyses = vec![
            analysis(2, 1, vec![candidate(2, 1, 1, "b", 0.8)]),
            analysis(1, 1, vec![candidate(1, 1, 1, "a", 0.8), candidate(1, 2, 1, "b", 0.8)]),
        ];
        let mut reversed = analyses.clone();
        reversed.reverse();

        let a = synthesize(&analyses, ChainAnalysis::default());
        let b = synthesize(&reversed, ChainAnalysis::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  “Same”,  quote! "), "same quote");
        assert_eq!(normalize("..."), "");
        assert!(similarity("abc", "abc") > 0.99);
    }
}
