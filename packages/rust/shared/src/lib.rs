//! Shared types, error model, and configuration for PaperForge.
//!
//! This crate is the foundation depended on by all other PaperForge crates.
//! It provides:
//! - [`PaperForgeError`] — the unified error type
//! - Domain types ([`ResearchQuery`], [`SourceSnippet`], [`PaperDocument`])
//! - Configuration ([`AppConfig`], config loading, API-key resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GeminiConfig, SourcesConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{PaperForgeError, Result};
pub use types::{PaperDocument, Reference, ResearchQuery, Section, SourceKind, SourceSnippet};
