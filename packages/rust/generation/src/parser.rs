//! Schema validation: strict JSON parse of the model response plus the
//! required-section check, producing a [`PaperDocument`].
//!
//! Any failure here is a [`PaperForgeError::SchemaMismatch`], which the
//! retry state machine recovers from by regenerating. Extra JSON fields are
//! accepted; a required field that is absent, mistyped, or blank is not.

use serde::Deserialize;
use tracing::debug;

use paperforge_shared::{PaperDocument, PaperForgeError, Reference, Result, Section};

use crate::REQUIRED_SECTIONS;

/// The raw response schema. Every field optional so that validation (not
/// serde) decides what is missing and can name it in the error.
#[derive(Debug, Default, Deserialize)]
struct RawPaper {
    topic: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    introduction: Option<String>,
    literature_review: Option<String>,
    methodology: Option<String>,
    analysis_and_findings: Option<String>,
    discussion: Option<String>,
    future_research: Option<String>,
    conclusion: Option<String>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    tools_used: Vec<String>,
}

impl RawPaper {
    fn section_body(&self, key: &str) -> Option<&String> {
        match key {
            "abstract" => self.abstract_text.as_ref(),
            "introduction" => self.introduction.as_ref(),
            "literature_review" => self.literature_review.as_ref(),
            "methodology" => self.methodology.as_ref(),
            "analysis_and_findings" => self.analysis_and_findings.as_ref(),
            "discussion" => self.discussion.as_ref(),
            "future_research" => self.future_research.as_ref(),
            "conclusion" => self.conclusion.as_ref(),
            _ => None,
        }
    }
}

/// Parse and validate a raw model response into a [`PaperDocument`].
pub fn parse_document(raw: &str) -> Result<PaperDocument> {
    let body = strip_code_fences(raw);

    let parsed: RawPaper = serde_json::from_str(body)
        .map_err(|e| PaperForgeError::schema_mismatch(format!("response is not valid JSON: {e}")))?;

    let missing: Vec<&str> = REQUIRED_SECTIONS
        .iter()
        .filter(|(key, _)| {
            parsed
                .section_body(key)
                .is_none_or(|body| body.trim().is_empty())
        })
        .map(|(key, _)| *key)
        .collect();

    if !missing.is_empty() {
        return Err(PaperForgeError::schema_mismatch(format!(
            "missing or empty required section(s): {}",
            missing.join(", ")
        )));
    }

    let title = parsed
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PaperForgeError::schema_mismatch("missing or empty required field: topic"))?
        .to_string();

    let sections = REQUIRED_SECTIONS
        .iter()
        .map(|(key, heading)| Section {
            heading: (*heading).to_string(),
            // Validated present and non-empty above.
            body: parsed.section_body(key).cloned().unwrap_or_default(),
        })
        .collect();

    let references = build_references(&parsed.sources);

    debug!(
        references = references.len(),
        tools = parsed.tools_used.len(),
        "model response validated"
    );

    Ok(PaperDocument {
        title,
        sections,
        references,
        tools_used: parsed
            .tools_used
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect(),
    })
}

/// Number the source strings `[1]`, `[2]`, ... and pull out link targets.
fn build_references(sources: &[String]) -> Vec<Reference> {
    sources
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, source)| Reference {
            label: format!("[{}] {source}", i + 1),
            url: is_http_url(source).then(|| source.to_string()),
        })
        .collect()
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Remove a Markdown code fence wrapping, if present. Models often wrap the
/// JSON in ```json ... ``` despite being told not to.
fn strip_code_fences(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```json") {
        t = rest;
    } else if let Some(rest) = t.strip_prefix("```") {
        t = rest;
    }
    if let Some(rest) = t.strip_suffix("```") {
        t = rest;
    }
    t.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_response(overrides: &[(&str, serde_json::Value)]) -> String {
        let mut value = serde_json::json!({
            "topic": "Quantum Error Correction",
            "abstract": "An abstract.",
            "introduction": "An introduction.",
            "literature_review": "Prior work.",
            "methodology": "Methods.",
            "analysis_and_findings": "Findings.",
            "discussion": "Discussion.",
            "future_research": "Future work.",
            "conclusion": "Conclusion.",
            "sources": ["https://arxiv.org/abs/quant-ph/9705052", "Shor, P. (1995)"],
            "tools_used": ["web_search"]
        });
        for (key, v) in overrides {
            value[*key] = v.clone();
        }
        value.to_string()
    }

    #[test]
    fn parses_a_complete_response() {
        let doc = parse_document(&full_response(&[])).unwrap();
        assert_eq!(doc.title, "Quantum Error Correction");
        assert_eq!(doc.sections.len(), REQUIRED_SECTIONS.len());
        assert_eq!(doc.sections[0].heading, "Abstract");
        assert_eq!(doc.sections.last().unwrap().heading, "Conclusion");
        assert_eq!(doc.references.len(), 2);
        assert_eq!(
            doc.references[0].url.as_deref(),
            Some("https://arxiv.org/abs/quant-ph/9705052")
        );
        assert!(doc.references[0].label.starts_with("[1] "));
        assert_eq!(doc.references[1].url, None);
        assert!(doc.references[1].label.starts_with("[2] "));
        assert_eq!(doc.tools_used, vec!["web_search"]);
    }

    #[test]
    fn strips_json_code_fences() {
        let fenced = format!("```json\n{}\n```", full_response(&[]));
        let doc = parse_document(&fenced).unwrap();
        assert_eq!(doc.title, "Quantum Error Correction");

        let bare_fence = format!("```\n{}\n```", full_response(&[]));
        assert!(parse_document(&bare_fence).is_ok());
    }

    #[test]
    fn invalid_json_is_schema_mismatch() {
        let err = parse_document("I am sorry, here is the paper:").unwrap_err();
        assert!(matches!(err, PaperForgeError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn missing_section_names_the_key() {
        let response = full_response(&[("methodology", serde_json::Value::Null)]);
        let err = parse_document(&response).unwrap_err();
        assert!(matches!(err, PaperForgeError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("methodology"));
    }

    #[test]
    fn blank_section_counts_as_missing() {
        let response = full_response(&[("discussion", serde_json::json!("   "))]);
        let err = parse_document(&response).unwrap_err();
        assert!(err.to_string().contains("discussion"));
    }

    #[test]
    fn missing_topic_is_rejected() {
        let response = full_response(&[("topic", serde_json::json!(""))]);
        let err = parse_document(&response).unwrap_err();
        assert!(err.to_string().contains("topic"));
    }

    #[test]
    fn extra_fields_and_empty_sources_are_accepted() {
        let response = full_response(&[
            ("extra_commentary", serde_json::json!("ignored")),
            ("sources", serde_json::json!([])),
            ("tools_used", serde_json::json!([])),
        ]);
        let doc = parse_document(&response).unwrap();
        assert!(doc.references.is_empty());
        assert!(doc.tools_used.is_empty());
    }

    #[test]
    fn blank_source_entries_are_dropped_but_numbering_stays_dense() {
        let response = full_response(&[(
            "sources",
            serde_json::json!(["  ", "https://example.com/a", "book chapter"]),
        )]);
        let doc = parse_document(&response).unwrap();
        assert_eq!(doc.references.len(), 2);
        assert_eq!(doc.references[0].label, "[1] https://example.com/a");
        assert_eq!(doc.references[1].label, "[2] book chapter");
    }

    #[test]
    fn unicode_section_bodies_survive() {
        let response = full_response(&[("abstract", serde_json::json!("日本語のテスト"))]);
        let doc = parse_document(&response).unwrap();
        assert_eq!(doc.section("Abstract"), Some("日本語のテスト"));
    }
}
