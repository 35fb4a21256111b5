//! DuckDuckGo Instant Answer search provider (no API key required).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use paperforge_shared::config::SourcesConfig;
use paperforge_shared::{PaperForgeError, Result, SourceKind, SourceSnippet};

use crate::{SearchProvider, build_client, truncate_snippet};

// ---------------------------------------------------------------------------
// Instant Answer response (the subset we read)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(default, rename = "Abstract")]
    abstract_text: String,
    #[serde(default, rename = "Heading")]
    heading: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default, rename = "RelatedTopics")]
    related_topics: Vec<RelatedTopic>,
}

/// Related topics are either plain entries or nested disambiguation groups;
/// with `skip_disambig=1` groups are rare, but we flatten them anyway.
#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(default, rename = "Text")]
    text: Option<String>,
    #[serde(default, rename = "FirstURL")]
    first_url: Option<String>,
    #[serde(default, rename = "Topics")]
    topics: Vec<RelatedTopic>,
}

// ---------------------------------------------------------------------------
// WebSearch provider
// ---------------------------------------------------------------------------

/// General web search backed by the DuckDuckGo Instant Answer API.
pub struct WebSearch {
    client: reqwest::Client,
    endpoint: Url,
    max_results: usize,
    max_snippet_chars: usize,
}

impl WebSearch {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.web_endpoint).map_err(|e| {
            PaperForgeError::config(format!(
                "invalid web search endpoint '{}': {e}",
                config.web_endpoint
            ))
        })?;

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint,
            max_results: config.max_results,
            max_snippet_chars: config.max_snippet_chars,
        })
    }

    fn push_topic(&self, topic: &RelatedTopic, out: &mut Vec<SourceSnippet>) {
        if out.len() >= self.max_results {
            return;
        }
        if let Some(text) = topic.text.as_deref().filter(|t| !t.trim().is_empty()) {
            out.push(SourceSnippet {
                source: SourceKind::WebSearch,
                text: truncate_snippet(text, self.max_snippet_chars),
                url: topic.first_url.clone().filter(|u| !u.is_empty()),
            });
        }
        for nested in &topic.topics {
            self.push_topic(nested, out);
        }
    }
}

#[async_trait]
impl SearchProvider for WebSearch {
    fn kind(&self) -> SourceKind {
        SourceKind::WebSearch
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn search(&self, topic: &str) -> Result<Vec<SourceSnippet>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", topic),
                ("format", "json"),
                ("no_redirect", "1"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| PaperForgeError::SourceUnavailable(format!("web search: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperForgeError::SourceUnavailable(format!(
                "web search returned HTTP {status}"
            )));
        }

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| PaperForgeError::SourceUnavailable(format!("web search body: {e}")))?;

        let mut snippets = Vec::new();

        // Instant answer abstract first, falling back to the bare heading.
        let lead = if !answer.abstract_text.is_empty() {
            Some(answer.abstract_text.as_str())
        } else if !answer.heading.is_empty() {
            Some(answer.heading.as_str())
        } else {
            None
        };
        if let Some(lead) = lead {
            snippets.push(SourceSnippet {
                source: SourceKind::WebSearch,
                text: truncate_snippet(lead, self.max_snippet_chars),
                url: (!answer.abstract_url.is_empty()).then(|| answer.abstract_url.clone()),
            });
        }

        for topic in &answer.related_topics {
            if snippets.len() >= self.max_results {
                break;
            }
            self.push_topic(topic, &mut snippets);
        }
        snippets.truncate(self.max_results);

        debug!(count = snippets.len(), "web search complete");
        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> SourcesConfig {
        SourcesConfig {
            web_endpoint: server.uri(),
            max_results: 3,
            max_snippet_chars: 200,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn parses_abstract_and_related_topics() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "Abstract": "Rust is a systems programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "Heading": "Rust",
            "RelatedTopics": [
                { "Text": "Cargo - the Rust package manager", "FirstURL": "https://doc.rust-lang.org/cargo/" },
                { "Text": "Borrow checker", "FirstURL": "" },
                { "Text": "Ignored because we already have three results" }
            ]
        });

        Mock::given(method("GET"))
            .and(query_param("q", "rust language"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let provider = WebSearch::new(&config_for(&server)).unwrap();
        let snippets = provider.search("rust language").await.unwrap();

        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0].text, "Rust is a systems programming language.");
        assert_eq!(
            snippets[0].url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)")
        );
        assert_eq!(snippets[1].url.as_deref(), Some("https://doc.rust-lang.org/cargo/"));
        // Empty FirstURL becomes None
        assert_eq!(snippets[2].url, None);
        assert!(snippets.iter().all(|s| s.source == SourceKind::WebSearch));
    }

    #[tokio::test]
    async fn falls_back_to_heading_and_flattens_groups() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "Abstract": "",
            "Heading": "Ferris",
            "RelatedTopics": [
                { "Topics": [ { "Text": "nested entry", "FirstURL": "https://x.example" } ] }
            ]
        });

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let provider = WebSearch::new(&config_for(&server)).unwrap();
        let snippets = provider.search("ferris").await.unwrap();

        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].text, "Ferris");
        assert_eq!(snippets[1].text, "nested entry");
    }

    #[tokio::test]
    async fn empty_answer_yields_no_snippets() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"Abstract": "", "RelatedTopics": []})),
            )
            .mount(&server)
            .await;

        let provider = WebSearch::new(&config_for(&server)).unwrap();
        let snippets = provider.search("nothing").await.unwrap();
        assert!(snippets.is_empty());
    }

    #[tokio::test]
    async fn http_error_is_source_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = WebSearch::new(&config_for(&server)).unwrap();
        let err = provider.search("rust").await.unwrap_err();
        assert!(matches!(err, PaperForgeError::SourceUnavailable(_)));
        assert!(err.to_string().contains("503"));
    }
}
