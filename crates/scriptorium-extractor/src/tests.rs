//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{collect_citations, Chunker, ChunkerConfig, Extractor, ExtractorConfig, ExtractorError};
    use scriptorium_domain::{
        CandidateThesis, Chapter, Citation, CitationType, Confidence, ReasoningType, Thesis,
        ThesisId, ThesisType, UnitAnalysis, UnitId,
    };
    use scriptorium_llm::{GatewayConfig, GenerationError, MockProvider};

    fn gateway_config() -> GatewayConfig {
        GatewayConfig {
            max_attempts: 2,
            timeout_secs: 5,
            backoff_ms: 0,
        }
    }

    fn extractor(provider: MockProvider) -> Extractor<MockProvider> {
        Extractor::new(provider, gateway_config(), ExtractorConfig::default())
    }

    fn candidate(unit: usize, position: usize, citations: Vec<Citation>) -> CandidateThesis {
        let unit_id = UnitId::from_ordinal(unit);
        CandidateThesis {
            id: CandidateThesis::local_id(&unit_id, position),
            unit_id,
            unit_ordinal: unit,
            part: 1,
            chapter: Chapter::Numbered(unit as u32),
            statement: format!("Thesis {}.{}", unit, position),
            description: String::new(),
            thesis_type: ThesisType::Main,
            supporting_text: "text".to_string(),
            reasoning_type: ReasoningType::Deductive,
            confidence: Confidence::new(0.8),
            citations,
        }
    }

    fn analysis(unit: usize, theses: Vec<CandidateThesis>, citations: Vec<Citation>) -> UnitAnalysis {
        UnitAnalysis {
            unit_id: UnitId::from_ordinal(unit),
            unit_ordinal: unit,
            part: 1,
            chapter: Chapter::Numbered(unit as u32),
            theses,
            citations,
        }
    }

    #[tokio::test]
    async fn test_full_unit_extraction_flow() {
        let provider = MockProvider::default();
        provider.add_response(
            "one with the Father",
            r#"Sure, here it is:
```json
{"theses": [{"statement": "Christ claimed deity", "thesis_type": "main",
  "supporting_text": "I and the Father are one", "confidence": 0.9,
  "citations": [{"reference": "Jo 10:30", "citation_type": "biblical"}]}],
 "citations": [{"reference": "Jo 10:30", "citation_type": "biblical"}]}
```"#,
        );

        let units = Chunker::new(ChunkerConfig::default())
            .chunk_detected("## Chapter 1\nHe said I and the Father are one with the Father.\n")
            .unwrap();
        assert_eq!(units.len(), 1);

        let extraction = extractor(provider.clone())
            .extract_unit(&units[0])
            .await
            .unwrap();

        assert_eq!(extraction.attempts, 1);
        assert_eq!(extraction.parsed.theses.len(), 1);
        assert_eq!(
            extraction.parsed.theses[0].statement.as_deref(),
            Some("Christ claimed deity")
        );
        assert!(extraction.raw.starts_with("Sure, here it is:"));
        assert!(extraction.raw.contains("```json"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_unit_makes_no_call() {
        let provider = MockProvider::default();
        let extractor = extractor(provider.clone());
        let mut units = Chunker::new(ChunkerConfig::default())
            .chunk_detected("## Chapter 1\nBody.\n")
            .unwrap();
        units[0].text = "  \n".to_string();

        let extraction = extractor.extract_unit(&units[0]).await.unwrap();
        assert_eq!(extraction.attempts, 0);
        assert!(extraction.parsed.theses.is_empty());
        assert!(extraction.raw.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_notes_unit_merges_harvested_citations() {
        let provider = MockProvider::new(
            r#"{"theses": [], "citations": [{"reference": "jo 3:16", "citation_type": "footnote"}]}"#,
        );
        let units = Chunker::new(ChunkerConfig::default())
            .chunk_detected(
                "## Chapter 1\nA chapter body long enough to keep the notes heading apart.\n## Notes\n\n1. Jo 3:16.\n2. FORSYTH, P.T. This Life and the Next. Independent Press, 1947.\n",
            )
            .unwrap();
        let notes = units.last().unwrap();
        assert_eq!(notes.chapter, Chapter::Trailing);

        let extraction = extractor(provider).extract_unit(notes).await.unwrap();
        let citations = &extraction.parsed.citations;

        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].reference.as_deref(), Some("jo 3:16"));
        assert_eq!(citations[1].citation_type.as_deref(), Some("scholarly"));
        assert_eq!(citations[1].author.as_deref(), Some("FORSYTH, P.T."));
        assert_eq!(citations[1].work.as_deref(), Some("This Life and the Next"));
    }

    #[tokio::test]
    async fn test_extraction_with_invalid_json_fails_after_retries() {
        let provider = MockProvider::new("This is not JSON");
        let extractor = extractor(provider.clone());
        let units = Chunker::new(ChunkerConfig::default())
            .chunk_detected("## Chapter 1\nBody.\n")
            .unwrap();

        let result = extractor.extract_unit(&units[0]).await;
        assert!(matches!(
            result,
            Err(ExtractorError::Generation(GenerationError::Schema { attempts: 2, .. }))
        ));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_chain_extraction_skips_single_thesis() {
        let provider = MockProvider::default();
        let extraction = extractor(provider.clone())
            .extract_chains(&[candidate(1, 1, vec![])])
            .await
            .unwrap();
        assert!(extraction.parsed.chains.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chain_extraction() {
        let provider = MockProvider::new(
            r#"{"chains": [{"from": "U1.T1", "to": "U2.T1", "relation": "supports",
                "explanation": "premise of", "strength": 0.8}],
               "argument_flow": "Linear."}"#,
        );
        let theses = vec![candidate(1, 1, vec![]), candidate(2, 1, vec![])];

        let extraction = extractor(provider.clone()).extract_chains(&theses).await.unwrap();
        assert_eq!(extraction.parsed.chains.len(), 1);
        assert_eq!(extraction.parsed.chains[0].to, "U2.T1");
        assert_eq!(extraction.parsed.argument_flow, "Linear.");
        assert!(provider.prompts()[0].contains("\"id\": \"U2.T1\""));
    }

    #[tokio::test]
    async fn test_correlation_skipped_without_citations() {
        let provider = MockProvider::default();
        let analyses = vec![analysis(1, vec![candidate(1, 1, vec![])], vec![])];

        let extraction = extractor(provider.clone())
            .correlate_citations(&analyses)
            .await
            .unwrap();
        assert!(extraction.parsed.groups.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_correlation() {
        let provider = MockProvider::new(
            r#"{"citation_groups": [{"theme": "Christology", "references": ["Jo 10:30"],
                 "related_thesis_ids": ["U1.T1"]}]}"#,
        );
        let jo = Citation::new("Jo 10:30", CitationType::Biblical);
        let analyses = vec![analysis(1, vec![candidate(1, 1, vec![jo.clone()])], vec![jo])];

        let extraction = extractor(provider).correlate_citations(&analyses).await.unwrap();
        assert_eq!(extraction.parsed.groups.len(), 1);
        assert_eq!(extraction.parsed.groups[0].theme, "Christology");
        assert!(extraction.parsed.cross_references.is_empty());
    }

    #[tokio::test]
    async fn test_summary_skipped_without_theses() {
        let provider = MockProvider::default();
        let extraction = extractor(provider.clone()).summarize(&[]).await.unwrap();
        assert_eq!(extraction.parsed, "");
        assert_eq!(extraction.attempts, 0);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_summary() {
        let provider = MockProvider::new(r#"{"summary": " Christ is the center. "}"#);
        let thesis = Thesis::from_candidate(
            ThesisId::new(1, Chapter::Numbered(1), 1),
            candidate(1, 1, vec![]),
        );

        let extraction = extractor(provider.clone()).summarize(&[thesis]).await.unwrap();
        assert_eq!(extraction.parsed, "Christ is the center.");
        assert_eq!(extraction.raw, r#"{"summary": " Christ is the center. "}"#);
        assert!(provider.prompts()[0].contains("executive summary"));
        assert!(provider.prompts()[0].contains("\"id\": \"1.1.1\""));
    }

    #[test]
    fn test_collect_citations_deduplicates_in_order() {
        let jo = Citation::new("Jo 3:16", CitationType::Biblical);
        let rm = Citation::new("Rm 5:8", CitationType::Biblical);
        let note = Citation::new("4", CitationType::Footnote);
        let analyses = vec![
            analysis(1, vec![candidate(1, 1, vec![jo.clone()])], vec![jo.clone(), note.clone()]),
            analysis(2, vec![candidate(2, 1, vec![rm.clone(), jo.clone()])], vec![]),
        ];

        let citations = collect_citations(&analyses);
        assert_eq!(citations, vec![jo, note, rm]);
    }
}
