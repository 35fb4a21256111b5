//! Source collection for PaperForge.
//!
//! Before prompting the model, the pipeline gathers grounding snippets from
//! two keyless text-retrieval services: the DuckDuckGo Instant Answer API
//! ([`WebSearch`]) and Wikipedia ([`Encyclopedia`]). Each provider gets a
//! single attempt, bounded by a maximum result count and snippet length;
//! the results are concatenated into one labelled context string under an
//! overall character budget.
//!
//! Collection is best-effort: the pipeline only sees
//! [`PaperForgeError::SourceUnavailable`] when *every* provider errors or
//! comes back empty, and even then it degrades to an empty context instead
//! of aborting.

mod encyclopedia;
mod web;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use paperforge_shared::config::SourcesConfig;
use paperforge_shared::{PaperForgeError, Result, SourceKind, SourceSnippet};

pub use encyclopedia::Encyclopedia;
pub use web::WebSearch;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("PaperForge/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow on search requests.
const MAX_REDIRECTS: usize = 3;

// ---------------------------------------------------------------------------
// SearchProvider
// ---------------------------------------------------------------------------

/// A text-retrieval collaborator: given a topic, return attributed snippets.
///
/// Implementations make a single attempt per call; retry policy (there is
/// none for sources) and degradation live in [`collect_context`].
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Which source this provider represents.
    fn kind(&self) -> SourceKind;

    /// Query the service once and return bounded snippets.
    async fn search(&self, topic: &str) -> Result<Vec<SourceSnippet>>;
}

/// Build the default provider set from config.
pub fn default_providers(config: &SourcesConfig) -> Result<Vec<Box<dyn SearchProvider>>> {
    Ok(vec![
        Box::new(WebSearch::new(config)?),
        Box::new(Encyclopedia::new(config)?),
    ])
}

// ---------------------------------------------------------------------------
// Context assembly
// ---------------------------------------------------------------------------

/// The assembled grounding context for one run.
#[derive(Debug, Clone)]
pub struct CollectedContext {
    /// Labelled snippet blocks, bounded by `max_context_chars`.
    pub context: String,
    /// Every snippet that made it into the context, in order.
    pub snippets: Vec<SourceSnippet>,
}

/// Query every provider once and concatenate the results.
///
/// Providers are queried sequentially in the order given. A provider error
/// is logged and skipped; only when no provider yields any snippet does this
/// return [`PaperForgeError::SourceUnavailable`].
#[instrument(skip_all, fields(topic = %topic, providers = providers.len()))]
pub async fn collect_context(
    providers: &[Box<dyn SearchProvider>],
    topic: &str,
    max_context_chars: usize,
) -> Result<CollectedContext> {
    let mut snippets: Vec<SourceSnippet> = Vec::new();
    let mut failures: Vec<String> = Vec::new();

    for provider in providers {
        let kind = provider.kind();
        match provider.search(topic).await {
            Ok(results) if !results.is_empty() => {
                debug!(source = %kind, count = results.len(), "provider returned snippets");
                snippets.extend(results);
            }
            Ok(_) => {
                warn!(source = %kind, "provider returned no results");
                failures.push(format!("{kind}: no results"));
            }
            Err(e) => {
                warn!(source = %kind, error = %e, "provider query failed");
                failures.push(format!("{kind}: {e}"));
            }
        }
    }

    if snippets.is_empty() {
        return Err(PaperForgeError::SourceUnavailable(failures.join("; ")));
    }

    let (context, kept) = assemble_context(&snippets, max_context_chars);

    Ok(CollectedContext {
        context,
        snippets: kept,
    })
}

/// Concatenate snippets into labelled blocks, dropping whole snippets once
/// the character budget is reached.
fn assemble_context(
    snippets: &[SourceSnippet],
    max_context_chars: usize,
) -> (String, Vec<SourceSnippet>) {
    let mut context = String::new();
    let mut kept = Vec::new();
    let mut current_kind: Option<SourceKind> = None;

    for snippet in snippets {
        let mut block = String::new();
        if current_kind != Some(snippet.source) {
            if !context.is_empty() {
                block.push_str("\n\n");
            }
            block.push_str(snippet.source.label());
            block.push_str(":\n");
        } else {
            block.push_str("\n\n");
        }
        block.push_str(&snippet.text);
        if let Some(url) = &snippet.url {
            block.push_str(" — ");
            block.push_str(url);
        }

        if context.chars().count() + block.chars().count() > max_context_chars {
            debug!(
                kept = kept.len(),
                total = snippets.len(),
                "context budget reached, dropping remaining snippets"
            );
            break;
        }

        context.push_str(&block);
        current_kind = Some(snippet.source);
        kept.push(snippet.clone());
    }

    (context, kept)
}

// ---------------------------------------------------------------------------
// Shared helpers for providers
// ---------------------------------------------------------------------------

/// Build a reqwest client with the settings shared by both providers.
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PaperForgeError::SourceUnavailable(format!("HTTP client build failed: {e}")))
}

/// Truncate to at most `max_chars` characters, never splitting a character.
/// Budgets too small to fit the `...` marker get a bare cut instead.
pub(crate) fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}
