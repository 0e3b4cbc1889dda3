//! Prompt templates and response schemas for the generation phases

use scriptorium_domain::{CandidateThesis, Citation, Thesis, Unit};
use scriptorium_llm::{JsonType, Prompt, Schema};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// System instruction shared by all phases
pub const SYSTEM_PROMPT: &str = "\
You are a systematic theologian and literary analyst. Your task is argument \
mining: identify theses (arguments and main propositions), biblical citations, \
scholarly references and footnotes in a book.

Rules:
- Use these canonical book abbreviations for biblical references: Gn, Ex, Lv, \
Nm, Dt, Js, Jz, Rt, 1Sm, 2Sm, 1Rs, 2Rs, 1Cr, 2Cr, Ed, Ne, Et, Jó, Sl, Pv, Ec, \
Ct, Is, Jr, Lm, Ez, Dn, Os, Jl, Am, Ob, Jn, Mq, Na, Hc, Sf, Ag, Zc, Ml, Mt, Mc, \
Lc, Jo, At, Rm, 1Co, 2Co, Gl, Ef, Fp, Cl, 1Ts, 2Ts, 1Tm, 2Tm, Tt, Fm, Hb, Tg, \
1Pe, 2Pe, 1Jo, 2Jo, 3Jo, Jd, Ap
- Return ONLY valid JSON, with no additional text
- Be precise and scholarly";

const UNIT_TEMPLATE: &str = "\
Analyze the following excerpt of the book.

Context:
- Part: {part}
- Chapter: {chapter}
- Excerpt title: {title}

Text:
{text}

Task: identify every thesis in this excerpt. For each thesis give:
- \"statement\": short, clear statement of the thesis (at most 100 characters)
- \"description\": explanation of the argument (2-4 sentences)
- \"thesis_type\": \"main\", \"supporting\", \"premise\" or \"conclusion\"
- \"supporting_text\": a LITERAL quotation from the text above that supports the statement
- \"reasoning_type\": \"deductive\", \"inductive\" or \"abductive\"
- \"citations\": citations used by this thesis, each with \"reference\", \"citation_type\" \
(\"biblical\", \"scholarly\" or \"footnote\") and, when available, \"text\"
- \"confidence\": your confidence in the identification, between 0.0 and 1.0

Important rules:
1. Every biblical citation MUST have a non-empty \"reference\" using the abbreviations \
above (for example \"Jo 3:16\", \"Rm 5:8\", \"1Co 2:2\").
2. If the text mentions a verse without quoting it, still identify its reference.
3. A reference of the form book chapter:verse is \"biblical\", never \"scholarly\".
4. When the text cites a theologian or author, use \"scholarly\" with \"reference\" set to \
the author name and fill \"author\", \"work\" and \"context\" (how the reference is used).
5. Numeric note markers are \"footnote\" citations.

Return a JSON object:
{\"theses\": [ ... ], \"citations\": [ ... every citation found in the excerpt ... ]}";

const CHAIN_TEMPLATE: &str = "\
Identify the logical relations between the following theses of the book. The \
argument of a book usually flows from one part to the next: look for relations \
across chapters and parts, not only within a chapter.

Theses:
{theses}

For each relation give:
- \"from\": id of the source thesis, exactly as listed above
- \"to\": id of the target thesis
- \"relation\": \"supports\", \"derives_from\", \"elaborates\", \"precedes\" or \"contradicts\"
- \"reasoning_type\": \"deductive\", \"inductive\" or \"abductive\"
- \"explanation\": one or two sentences
- \"strength\": between 0.0 and 1.0

Return a JSON object:
{\"chains\": [ ... ], \"argument_flow\": \"5-8 sentences describing the overall flow of the argument\"}";

const CORRELATION_TEMPLATE: &str = "\
Group the following citations of the book by theological theme and identify \
cross references between them.

Citations:
{citations}

Theses using them (for context):
{theses}

Suggested themes (add others when needed): Christology, Soteriology, Hamartiology, \
Ecclesiology, Eschatology, Theology proper, Theological anthropology.

Each citation should belong to exactly one theme.

Return a JSON object:
{\"citation_groups\": [{\"theme\": \"...\", \"description\": \"...\", \"references\": [\"Jo 3:16\"], \
\"related_thesis_ids\": [\"U3.T1\"]}], \
\"cross_references\": [{\"primary\": \"Jo 3:16\", \"related\": [\"Rm 5:8\"], \"connection\": \"...\"}]}";

const SUMMARY_TEMPLATE: &str = "\
Write an executive summary of the central argument of the book, based on its \
final, deduplicated theses grouped by part.

Theses by part:
{theses}

The summary takes 5-8 sentences and shows how the parts build on each other. \
Do not restate every thesis; explain how they connect.

Return a JSON object:
{\"summary\": \"...\"}";

/// Cut `text` to at most `limit` bytes on a character boundary
pub fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Prompt for per-unit thesis and citation extraction
pub fn unit_prompt(unit: &Unit, text_limit: usize) -> Prompt {
    let user = UNIT_TEMPLATE
        .replace("{part}", &unit.part.to_string())
        .replace("{chapter}", &unit.chapter.to_string())
        .replace("{title}", &unit.title)
        .replace("{text}", truncate(&unit.text, text_limit));
    Prompt::new(SYSTEM_PROMPT, user)
}

/// Expected shape of a unit extraction response
pub fn unit_schema() -> Schema {
    Schema::new("unit_extraction")
        .required("theses", JsonType::Array)
        .optional("citations", JsonType::Array)
}

/// Prompt for chain extraction over all candidate theses
pub fn chain_prompt(theses: &[CandidateThesis], excerpt_chars: usize) -> Prompt {
    let summary: Vec<Value> = theses
        .iter()
        .map(|t| {
            let excerpt: String = t.supporting_text.chars().take(excerpt_chars).collect();
            json!({
                "id": t.id,
                "statement": t.statement,
                "description": t.description,
                "type": t.thesis_type,
                "part": t.part,
                "chapter": t.chapter,
                "supporting_text": excerpt,
            })
        })
        .collect();
    let user = CHAIN_TEMPLATE.replace("{theses}", &pretty(&Value::Array(summary)));
    Prompt::new(SYSTEM_PROMPT, user)
}

/// Expected shape of a chain extraction response
pub fn chain_schema() -> Schema {
    Schema::new("chain_extraction")
        .required("chains", JsonType::Array)
        .optional("argument_flow", JsonType::String)
}

/// Prompt for thematic correlation of citations
pub fn correlation_prompt(citations: &[Citation], theses: &[CandidateThesis]) -> Prompt {
    let context: Vec<Value> = theses
        .iter()
        .filter(|t| !t.citations.is_empty())
        .map(|t| {
            let refs: Vec<&str> = t.citations.iter().map(|c| c.reference.as_str()).collect();
            json!({
                "id": t.id,
                "statement": t.statement,
                "part": t.part,
                "chapter": t.chapter,
                "citation_refs": refs,
            })
        })
        .collect();
    let citations = serde_json::to_value(citations).unwrap_or(Value::Null);
    let user = CORRELATION_TEMPLATE
        .replace("{citations}", &pretty(&citations))
        .replace("{theses}", &pretty(&Value::Array(context)));
    Prompt::new(SYSTEM_PROMPT, user)
}

/// Expected shape of a citation correlation response
pub fn correlation_schema() -> Schema {
    Schema::new("citation_correlation")
        .required("citation_groups", JsonType::Array)
        .optional("cross_references", JsonType::Array)
}

/// Prompt for the executive summary over the final theses
pub fn summary_prompt(theses: &[Thesis]) -> Prompt {
    let mut by_part: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for thesis in theses {
        by_part
            .entry(format!("Part {}", thesis.part))
            .or_default()
            .push(json!({
                "id": thesis.id,
                "statement": thesis.statement,
                "description": thesis.description,
                "type": thesis.thesis_type,
                "chapter": thesis.chapter,
            }));
    }
    let theses = serde_json::to_value(by_part).unwrap_or(Value::Null);
    let user = SUMMARY_TEMPLATE.replace("{theses}", &pretty(&theses));
    Prompt::new(SYSTEM_PROMPT, user)
}

/// Expected shape of a summary response
pub fn summary_schema() -> Schema {
    Schema::new("book_summary").required("summary", JsonType::String)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
