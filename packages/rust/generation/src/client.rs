//! Generation client: the `GenerationProvider` trait and the Gemini REST
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use paperforge_shared::config::GeminiConfig;
use paperforge_shared::{PaperForgeError, Result};

/// A generative-model collaborator: one prompt in, raw response text out.
///
/// Implementations make exactly one request per call; the retry loop in
/// [`crate::generate_document`] owns regeneration.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Gemini wire types (the subset we use)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Client for the Google Generative Language REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from config plus the resolved API key.
    pub fn new(config: &GeminiConfig, api_key: String) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            PaperForgeError::config(format!(
                "invalid generation endpoint '{}': {e}",
                config.endpoint
            ))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("PaperForge/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaperForgeError::Generation(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %model, prompt_chars = prompt.chars().count()))]
    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        let url = self
            .endpoint
            .join(&format!("v1beta/models/{model}:generateContent"))
            .map_err(|e| PaperForgeError::Generation(format!("generation URL: {e}")))?;

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| PaperForgeError::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaperForgeError::Generation(format!(
                "model API returned HTTP {status}: {}",
                excerpt(&body, 200)
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PaperForgeError::Generation(format!("unreadable response body: {e}")))?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(PaperForgeError::Generation(
                "model returned no candidates".into(),
            ));
        }

        debug!(response_chars = text.chars().count(), "generation complete");
        Ok(text)
    }
}

/// First `max_chars` characters of a string, safe on multi-byte boundaries.
fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
