//! End-to-end research pipeline: topic → collect sources → build prompt →
//! generate+validate → render PDF.
//!
//! Strictly sequential, single pass. The only branching back is the bounded
//! retry loop inside [`paperforge_generation::generate_document`]; the only
//! locally-recovered failure is [`PaperForgeError::SourceUnavailable`],
//! which degrades the run to an empty context instead of aborting.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument, warn};

use paperforge_generation::{GenerationProvider, build_prompt, generate_document};
use paperforge_render::{RenderProvider, write_document};
use paperforge_shared::{PaperForgeError, ResearchQuery, Result};
use paperforge_sources::{SearchProvider, collect_context};

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Topic, model, and output path from the CLI.
    pub query: ResearchQuery,
    /// Maximum generate+parse attempts before giving up.
    pub max_attempts: u32,
    /// Character budget for the assembled source context.
    pub max_context_chars: usize,
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub struct RunResult {
    /// Where the PDF was written.
    pub output_path: PathBuf,
    /// Title of the generated paper.
    pub title: String,
    /// Number of rendered sections.
    pub section_count: usize,
    /// Number of rendered references.
    pub reference_count: usize,
    /// How many generation attempts the run took.
    pub attempts: u32,
    /// Number of source snippets that grounded the prompt.
    pub snippet_count: usize,
    /// True when every source provider failed and the run proceeded with an
    /// empty context.
    pub degraded: bool,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after source collection with the snippet count.
    fn sources_collected(&self, count: usize, degraded: bool);
    /// Called when the pipeline completes.
    fn done(&self, result: &RunResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn sources_collected(&self, _count: usize, _degraded: bool) {}
    fn done(&self, _result: &RunResult) {}
}

/// Run the full research pipeline.
///
/// 1. Collect source snippets (degrade to empty context if all fail)
/// 2. Build the prompt
/// 3. Generate and validate the document (bounded retries)
/// 4. Render and write the PDF
#[instrument(skip_all, fields(topic = %config.query.topic, model = %config.query.model_name))]
pub async fn run_research(
    config: &ResearchConfig,
    providers: &[Box<dyn SearchProvider>],
    generator: &dyn GenerationProvider,
    renderer: &dyn RenderProvider,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    let start = Instant::now();

    // --- Phase 1: Source collection ---
    progress.phase("Collecting sources");
    let (context, snippet_count, degraded) =
        match collect_context(providers, &config.query.topic, config.max_context_chars).await {
            Ok(collected) => (collected.context, collected.snippets.len(), false),
            Err(PaperForgeError::SourceUnavailable(reason)) => {
                warn!(%reason, "all source providers failed, continuing with empty context");
                (String::new(), 0, true)
            }
            Err(other) => return Err(other),
        };
    progress.sources_collected(snippet_count, degraded);

    // --- Phase 2: Prompt ---
    progress.phase("Building prompt");
    let prompt = build_prompt(&config.query.topic, &context)?;

    // --- Phase 3: Generation with bounded retries ---
    progress.phase("Generating paper");
    let outcome = generate_document(
        generator,
        &prompt,
        &config.query.model_name,
        config.max_attempts,
    )
    .await?;

    // --- Phase 4: Render ---
    progress.phase("Rendering PDF");
    let document = outcome.document;
    write_document(renderer, &document, &config.query.output_path)?;

    let result = RunResult {
        output_path: config.query.output_path.clone(),
        title: document.title,
        section_count: document.sections.len(),
        reference_count: document.references.len(),
        attempts: outcome.attempts,
        snippet_count,
        degraded,
        elapsed: start.elapsed(),
    };

    info!(
        title = %result.title,
        attempts = result.attempts,
        snippets = result.snippet_count,
        degraded = result.degraded,
        path = %result.output_path.display(),
        "research pipeline complete"
    );

    progress.done(&result);
    Ok(result)
}
