//! Application configuration for PaperForge.
//!
//! User config lives at `~/.paperforge/paperforge.toml`.
//! CLI flags override config file values, which override defaults.
//! The API key itself is never stored; the config only names the
//! environment variable that holds it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PaperForgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "paperforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".paperforge";

// ---------------------------------------------------------------------------
// Config structs (matching paperforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Gemini generation settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Search source settings.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default generation model.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum generate+parse attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_max_attempts() -> u32 {
    3
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API endpoint origin. Overridable for tests.
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    /// Per-call timeout in seconds for generation requests.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            endpoint: default_gemini_endpoint(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_generation_timeout() -> u64 {
    30
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// DuckDuckGo Instant Answer API origin.
    #[serde(default = "default_web_endpoint")]
    pub web_endpoint: String,

    /// Wikipedia origin (serves both the MediaWiki and REST APIs).
    #[serde(default = "default_wiki_endpoint")]
    pub wiki_endpoint: String,

    /// Maximum results taken from each provider.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Maximum characters kept per snippet.
    #[serde(default = "default_max_snippet_chars")]
    pub max_snippet_chars: usize,

    /// Maximum characters of assembled context handed to the model.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Per-call timeout in seconds for search requests.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            web_endpoint: default_web_endpoint(),
            wiki_endpoint: default_wiki_endpoint(),
            max_results: default_max_results(),
            max_snippet_chars: default_max_snippet_chars(),
            max_context_chars: default_max_context_chars(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_web_endpoint() -> String {
    "https://api.duckduckgo.com".into()
}
fn default_wiki_endpoint() -> String {
    "https://en.wikipedia.org".into()
}
fn default_max_results() -> usize {
    5
}
fn default_max_snippet_chars() -> usize {
    800
}
fn default_max_context_chars() -> usize {
    12_000
}
fn default_search_timeout() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.paperforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PaperForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.paperforge/paperforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PaperForgeError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PaperForgeError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PaperForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PaperForgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PaperForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the generation API key from the configured environment variable.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.gemini.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(PaperForgeError::config(format!(
            "generation API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://aistudio.google.com/apikey"
        ))),
    }
}
