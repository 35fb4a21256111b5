//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use paperforge_core::{ProgressReporter, ResearchConfig, RunResult, run_research};
use paperforge_generation::GeminiClient;
use paperforge_render::PdfRenderer;
use paperforge_shared::{
    ResearchQuery, config_file_path, init_config, load_config, resolve_api_key,
};
use paperforge_sources::default_providers;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PaperForge: turn a research topic into a citation-backed PDF.
#[derive(Parser)]
#[command(
    name = "paperforge",
    version,
    about = "Generate a structured research paper PDF from a topic, grounded in web and encyclopedia sources.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Research topic or question.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Generation model identifier (defaults from config).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output PDF path (defaults to a name derived from the topic).
    #[arg(short, long)]
    pub out: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = format!(
        "paperforge_cli={level},paperforge_core={level},paperforge_sources={level},\
         paperforge_generation={level},paperforge_render={level},paperforge_shared={level}"
    );

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
        None => {
            let query = cli
                .query
                .ok_or_else(|| eyre!("missing research topic: pass one with --query/-q"))?;
            cmd_generate(&query, cli.model.as_deref(), cli.out.as_deref()).await
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(query: &str, model: Option<&str>, out: Option<&str>) -> Result<()> {
    // Validate config and API key before doing anything
    let config = load_config()?;
    let api_key = resolve_api_key(&config)?;

    let model = model
        .map(String::from)
        .unwrap_or_else(|| config.defaults.model.clone());
    let output_path = output_path_for(query, out);

    let research_config = ResearchConfig {
        query: ResearchQuery {
            topic: query.to_string(),
            model_name: model.clone(),
            output_path,
        },
        max_attempts: config.defaults.max_attempts,
        max_context_chars: config.sources.max_context_chars,
    };

    let providers = default_providers(&config.sources)?;
    let generator = GeminiClient::new(&config.gemini, api_key)?;
    let renderer = PdfRenderer::new();

    info!(topic = query, model = %model, "generating research paper");

    let reporter = CliProgress::new();
    let result = run_research(
        &research_config,
        &providers,
        &generator,
        &renderer,
        &reporter,
    )
    .await?;

    // Print summary
    println!();
    println!("  Research paper generated!");
    println!("  Title:      {}", result.title);
    println!("  Sections:   {}", result.section_count);
    println!("  References: {}", result.reference_count);
    println!("  Attempts:   {}", result.attempts);
    if result.degraded {
        println!("  Sources:    none (all providers unavailable, generated without grounding)");
    } else {
        println!("  Sources:    {} snippet(s)", result.snippet_count);
    }
    println!("  Output:     {}", result.output_path.display());
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;
    println!("# resolved config ({})", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Output path derivation
// ---------------------------------------------------------------------------

/// Resolve the output path: explicit flag (with `.pdf` appended when no
/// extension is given), otherwise a slug derived from the topic.
fn output_path_for(query: &str, out: Option<&str>) -> PathBuf {
    match out {
        Some(p) => {
            let mut path = PathBuf::from(p);
            if path.extension().is_none() {
                path.set_extension("pdf");
            }
            path
        }
        None => PathBuf::from(format!("{}.pdf", slugify(query))),
    }
}

/// Lowercase alphanumeric slug with single dashes, capped at 60 characters.
fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true; // suppress a leading dash
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.chars().count() >= 60 {
            break;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "research-paper".to_string()
    } else {
        slug
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn sources_collected(&self, count: usize, degraded: bool) {
        if degraded {
            self.spinner
                .set_message("No sources available, continuing without grounding");
        } else {
            self.spinner.set_message(format!("Collected {count} snippet(s)"));
        }
    }

    fn done(&self, _result: &RunResult) {
        self.spinner.finish_and_clear();
    }
}
