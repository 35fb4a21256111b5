//! Core domain types for the research-paper pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ResearchQuery
// ---------------------------------------------------------------------------

/// A single research request, built from CLI input. Immutable for the
/// duration of one run.
#[derive(Debug, Clone)]
pub struct ResearchQuery {
    /// The research topic or question.
    pub topic: String,
    /// Generation model identifier (e.g., `gemini-2.5-flash`).
    pub model_name: String,
    /// Where the rendered PDF is written.
    pub output_path: PathBuf,
}

// ---------------------------------------------------------------------------
// SourceSnippet
// ---------------------------------------------------------------------------

/// Which external search service a snippet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    WebSearch,
    Encyclopedia,
}

impl SourceKind {
    /// Label used when assembling the context block.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WebSearch => "WEB SEARCH",
            Self::Encyclopedia => "ENCYCLOPEDIA",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A short retrieved text fragment plus its source attribution, used as
/// grounding context for generation. Read-only after collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnippet {
    /// Originating service.
    pub source: SourceKind,
    /// Snippet text, already truncated to the configured bound.
    pub text: String,
    /// Source URL when the service provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// PaperDocument
// ---------------------------------------------------------------------------

/// One titled body block of the paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Display heading (e.g., "Literature Review").
    pub heading: String,
    /// Generated prose for this section.
    pub body: String,
}

/// One entry in the references list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Display label, numbered in citation order (e.g., `[1] ...`).
    pub label: String,
    /// Link target when the source string is an http(s) URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The validated document produced from the model response.
///
/// Invariant: `sections` is non-empty and covers every required heading in
/// order; the parser rejects (and the caller retries) any response that
/// would violate this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperDocument {
    /// Paper title (the model's `topic` field).
    pub title: String,
    /// Ordered sections, one per required heading.
    pub sections: Vec<Section>,
    /// Ordered references, numbered from `[1]`.
    pub references: Vec<Reference>,
    /// Tools the model claims to have drawn on. Optional extra content,
    /// rendered as a trailing note when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
}

impl PaperDocument {
    /// Look up a section body by heading, mainly for tests and summaries.
    pub fn section(&self, heading: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.heading == heading)
            .map(|s| s.body.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_labels() {
        assert_eq!(SourceKind::WebSearch.label(), "WEB SEARCH");
        assert_eq!(SourceKind::Encyclopedia.to_string(), "ENCYCLOPEDIA");
    }

    #[test]
    fn section_lookup() {
        let doc = PaperDocument {
            title: "T".into(),
            sections: vec![Section {
                heading: "Abstract".into(),
                body: "short".into(),
            }],
            references: vec![],
            tools_used: vec![],
        };
        assert_eq!(doc.section("Abstract"), Some("short"));
        assert_eq!(doc.section("Conclusion"), None);
    }

    #[test]
    fn snippet_serializes_without_empty_url() {
        let snippet = SourceSnippet {
            source: SourceKind::WebSearch,
            text: "fact".into(),
            url: None,
        };
        let json = serde_json::to_string(&snippet).unwrap();
        assert!(json.contains(r#""source":"web_search"#));
        assert!(!json.contains("url"));
    }
}
