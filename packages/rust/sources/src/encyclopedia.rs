//! Wikipedia encyclopedia provider.
//!
//! Two-step lookup: a MediaWiki full-text search for matching titles, then
//! one REST summary fetch per title. A failed summary fetch skips that title
//! rather than failing the whole query.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use paperforge_shared::config::SourcesConfig;
use paperforge_shared::{PaperForgeError, Result, SourceKind, SourceSnippet};

use crate::{SearchProvider, build_client, truncate_snippet};

// ---------------------------------------------------------------------------
// MediaWiki / REST response shapes (the subset we read)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<DesktopUrls>,
}

#[derive(Debug, Deserialize)]
struct DesktopUrls {
    page: Option<String>,
}

// ---------------------------------------------------------------------------
// Encyclopedia provider
// ---------------------------------------------------------------------------

/// Encyclopedia lookups backed by Wikipedia's search and summary APIs.
pub struct Encyclopedia {
    client: reqwest::Client,
    endpoint: Url,
    max_results: usize,
    max_snippet_chars: usize,
}

impl Encyclopedia {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.wiki_endpoint).map_err(|e| {
            PaperForgeError::config(format!(
                "invalid encyclopedia endpoint '{}': {e}",
                config.wiki_endpoint
            ))
        })?;

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint,
            max_results: config.max_results,
            max_snippet_chars: config.max_snippet_chars,
        })
    }

    /// Search for page titles matching the topic.
    async fn search_titles(&self, topic: &str) -> Result<Vec<String>> {
        let url = self.endpoint.join("w/api.php").map_err(|e| {
            PaperForgeError::SourceUnavailable(format!("encyclopedia URL: {e}"))
        })?;

        let limit = self.max_results.to_string();
        let response = self
            .client
            .get(url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", topic),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| PaperForgeError::SourceUnavailable(format!("encyclopedia search: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperForgeError::SourceUnavailable(format!(
                "encyclopedia search returned HTTP {status}"
            )));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            PaperForgeError::SourceUnavailable(format!("encyclopedia search body: {e}"))
        })?;

        Ok(parsed.query.search.into_iter().map(|h| h.title).collect())
    }

    /// Fetch the lead summary for one page title.
    async fn fetch_summary(&self, title: &str) -> Result<PageSummary> {
        let mut url = self.endpoint.clone();
        {
            // Wikipedia canonicalizes titles with underscores; everything else
            // reserved in a path segment (/, ?, #, %) must be percent-encoded,
            // which push() does for us.
            let mut segments = url.path_segments_mut().map_err(|()| {
                PaperForgeError::SourceUnavailable("encyclopedia endpoint cannot be a base".into())
            })?;
            segments
                .pop_if_empty()
                .extend(["api", "rest_v1", "page", "summary"])
                .push(&title.replace(' ', "_"));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PaperForgeError::SourceUnavailable(format!("encyclopedia summary: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperForgeError::SourceUnavailable(format!(
                "summary for '{title}' returned HTTP {status}"
            )));
        }

        response.json().await.map_err(|e| {
            PaperForgeError::SourceUnavailable(format!("encyclopedia summary body: {e}"))
        })
    }
}

#[async_trait]
impl SearchProvider for Encyclopedia {
    fn kind(&self) -> SourceKind {
        SourceKind::Encyclopedia
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn search(&self, topic: &str) -> Result<Vec<SourceSnippet>> {
        let titles = self.search_titles(topic).await?;

        let mut snippets = Vec::new();
        for title in titles.iter().take(self.max_results) {
            match self.fetch_summary(title).await {
                Ok(summary) if !summary.extract.trim().is_empty() => {
                    let display_title = if summary.title.is_empty() {
                        title.as_str()
                    } else {
                        summary.title.as_str()
                    };
                    let text = format!("{display_title}: {}", summary.extract);
                    snippets.push(SourceSnippet {
                        source: SourceKind::Encyclopedia,
                        text: truncate_snippet(&text, self.max_snippet_chars),
                        url: summary.content_urls.and_then(|c| c.desktop).and_then(|d| d.page),
                    });
                }
                Ok(_) => {
                    debug!(title, "summary had no extract, skipping");
                }
                Err(e) => {
                    warn!(title, error = %e, "summary fetch failed, skipping title");
                }
            }
        }

        debug!(count = snippets.len(), "encyclopedia search complete");
        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> SourcesConfig {
        SourcesConfig {
            wiki_endpoint: server.uri(),
            max_results: 2,
            max_snippet_chars: 300,
            ..Default::default()
        }
    }

    async fn mount_search(server: &MockServer, titles: &[&str]) {
        let hits: Vec<_> = titles
            .iter()
            .map(|t| serde_json::json!({"title": t}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"query": {"search": hits}})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn searches_then_summarizes_each_title() {
        let server = MockServer::start().await;
        mount_search(&server, &["Rust", "Cargo"]).await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Rust",
                "extract": "Rust is a programming language.",
                "content_urls": {"desktop": {"page": "https://en.wikipedia.org/wiki/Rust"}}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Cargo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Cargo",
                "extract": "Cargo is the package manager.",
            })))
            .mount(&server)
            .await;

        let provider = Encyclopedia::new(&config_for(&server)).unwrap();
        let snippets = provider.search("rust").await.unwrap();

        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].text, "Rust: Rust is a programming language.");
        assert_eq!(
            snippets[0].url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust")
        );
        assert_eq!(snippets[1].url, None);
        assert!(snippets.iter().all(|s| s.source == SourceKind::Encyclopedia));
    }

    #[tokio::test]
    async fn multi_word_titles_use_underscores() {
        let server = MockServer::start().await;
        mount_search(&server, &["Rust belt"]).await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Rust_belt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Rust belt",
                "extract": "A region.",
            })))
            .mount(&server)
            .await;

        let provider = Encyclopedia::new(&config_for(&server)).unwrap();
        let snippets = provider.search("rust belt").await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].text, "Rust belt: A region.");
    }

    #[tokio::test]
    async fn reserved_characters_in_titles_are_percent_encoded() {
        let server = MockServer::start().await;
        mount_search(&server, &["AC/DC", "Who? (album)"]).await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/AC%2FDC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "AC/DC",
                "extract": "A rock band.",
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Who%3F_(album)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Who? (album)",
                "extract": "An album.",
            })))
            .mount(&server)
            .await;

        let provider = Encyclopedia::new(&config_for(&server)).unwrap();
        let snippets = provider.search("ac dc").await.unwrap();

        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].text, "AC/DC: A rock band.");
        assert_eq!(snippets[1].text, "Who? (album): An album.");
    }

    #[tokio::test]
    async fn failed_summary_skips_that_title() {
        let server = MockServer::start().await;
        mount_search(&server, &["Good", "Gone"]).await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Good",
                "extract": "Survives.",
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = Encyclopedia::new(&config_for(&server)).unwrap();
        let snippets = provider.search("anything").await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].text, "Good: Survives.");
    }

    #[tokio::test]
    async fn search_error_is_source_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = Encyclopedia::new(&config_for(&server)).unwrap();
        let err = provider.search("rust").await.unwrap_err();
        assert!(matches!(err, PaperForgeError::SourceUnavailable(_)));
    }
}
