//! Pipeline orchestration for PaperForge.
//!
//! Wires the source collector, prompt builder, generation loop, and renderer
//! into one sequential run. All collaborators enter through traits
//! ([`paperforge_sources::SearchProvider`],
//! [`paperforge_generation::GenerationProvider`],
//! [`paperforge_render::RenderProvider`]), so tests drive the pipeline with
//! deterministic fakes.

pub mod pipeline;

pub use pipeline::{ProgressReporter, ResearchConfig, RunResult, SilentProgress, run_research};
