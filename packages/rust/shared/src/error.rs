//! Error types for PaperForge.
//!
//! Library crates use [`PaperForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Recovery policy: `SourceUnavailable` is recovered by the pipeline
//! (degrade to an empty context), `SchemaMismatch` is recovered by the
//! generation retry loop up to its bound, everything else surfaces to the
//! CLI unchanged.

use std::path::PathBuf;

/// Top-level error type for all PaperForge operations.
#[derive(Debug, thiserror::Error)]
pub enum PaperForgeError {
    /// Configuration loading or validation error (including a missing API key).
    #[error("config error: {message}")]
    Config { message: String },

    /// Input validation error (e.g., empty research topic).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Every search provider failed or returned no results.
    #[error("no sources available: {0}")]
    SourceUnavailable(String),

    /// Transport, authentication, or rate-limit failure from the model API.
    #[error("generation error: {0}")]
    Generation(String),

    /// The model response failed JSON parsing or the required-section check.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The generation retry bound was exhausted without a valid document.
    #[error("generation failed after {attempts} attempt(s): model never returned a valid document")]
    GenerationFailed { attempts: u32 },

    /// PDF assembly or output write failure.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PaperForgeError>;

impl PaperForgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a schema-mismatch error from any displayable message.
    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
