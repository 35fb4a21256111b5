//! Generation for PaperForge: prompt assembly, the model client, strict
//! schema parsing, and the bounded retry loop that ties them together.
//!
//! The retry loop is the only branching logic in the whole pipeline, so it
//! is modeled as an explicit state machine ([`GenerationState`]) rather than
//! an implicit loop: each schema failure moves `ParseFailed(n)` forward until
//! either a response validates or the bound is hit and the loop escalates to
//! the terminal `GenerationFailed` error. Transport-level failures from the
//! client are never retried here; regenerating after those is the caller's
//! decision.

pub mod client;
pub mod parser;
pub mod prompt;

use tracing::{info, instrument, warn};

use paperforge_shared::{PaperDocument, PaperForgeError, Result};

pub use client::{GeminiClient, GenerationProvider};
pub use parser::parse_document;
pub use prompt::build_prompt;

/// Required section schema, in rendering order: JSON key and display heading.
pub const REQUIRED_SECTIONS: &[(&str, &str)] = &[
    ("abstract", "Abstract"),
    ("introduction", "Introduction"),
    ("literature_review", "Literature Review"),
    ("methodology", "Methodology"),
    ("analysis_and_findings", "Analysis and Findings"),
    ("discussion", "Discussion"),
    ("future_research", "Future Research"),
    ("conclusion", "Conclusion"),
];

// ---------------------------------------------------------------------------
// Retry state machine
// ---------------------------------------------------------------------------

/// State of the generate+parse loop. `ParseFailed(n)` counts completed
/// attempts that ended in a schema mismatch.
#[derive(Debug)]
pub enum GenerationState {
    Pending,
    ParseFailed(u32),
    Succeeded {
        document: PaperDocument,
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
    },
}

/// A validated document plus how many attempts it took.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub document: PaperDocument,
    pub attempts: u32,
}

/// Drive the model until a response validates or the bound is exhausted.
///
/// Schema mismatches are recovered by regenerating (same prompt, fresh
/// response) up to `max_attempts`; any other error from the provider
/// surfaces immediately.
#[instrument(skip_all, fields(model = %model, max_attempts))]
pub async fn generate_document(
    provider: &dyn GenerationProvider,
    prompt: &str,
    model: &str,
    max_attempts: u32,
) -> Result<GenerationOutcome> {
    let mut state = GenerationState::Pending;

    loop {
        state = match state {
            GenerationState::Pending => {
                attempt_once(provider, prompt, model, 0, max_attempts).await?
            }
            GenerationState::ParseFailed(completed) => {
                attempt_once(provider, prompt, model, completed, max_attempts).await?
            }
            GenerationState::Succeeded { document, attempts } => {
                info!(attempts, "model returned a valid document");
                return Ok(GenerationOutcome { document, attempts });
            }
            GenerationState::Exhausted { attempts } => {
                return Err(PaperForgeError::GenerationFailed { attempts });
            }
        };
    }
}

/// One state transition: either exhaust the bound or run generate+parse once.
async fn attempt_once(
    provider: &dyn GenerationProvider,
    prompt: &str,
    model: &str,
    completed: u32,
    max_attempts: u32,
) -> Result<GenerationState> {
    if completed >= max_attempts {
        return Ok(GenerationState::Exhausted {
            attempts: completed,
        });
    }

    let attempt = completed + 1;
    let raw = provider.generate(prompt, model).await?;

    match parser::parse_document(&raw) {
        Ok(document) => Ok(GenerationState::Succeeded {
            document,
            attempts: attempt,
        }),
        Err(PaperForgeError::SchemaMismatch { message }) => {
            warn!(attempt, max_attempts, %message, "schema mismatch, retrying generation");
            Ok(GenerationState::ParseFailed(attempt))
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted provider: pops one canned response per call.
    struct ScriptedProvider {
        responses: Mutex<Vec<Result<String>>>,
        calls: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationProvider for ScriptedProvider {
        async fn generate(&self, _prompt: &str, _model: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .expect("provider called more times than scripted")
        }
    }

    fn valid_paper_json(topic: &str) -> String {
        serde_json::json!({
            "topic": topic,
            "abstract": "a",
            "introduction": "b",
            "literature_review": "c",
            "methodology": "d",
            "analysis_and_findings": "e",
            "discussion": "f",
            "future_research": "g",
            "conclusion": "h",
            "sources": ["https://example.com/paper"],
            "tools_used": ["web_search"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn succeeds_first_attempt() {
        let provider = ScriptedProvider::new(vec![Ok(valid_paper_json("Oxidation"))]);
        let outcome = generate_document(&provider, "p", "m", 3).await.unwrap();
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.document.title, "Oxidation");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn retries_after_schema_mismatch_and_keeps_second_content() {
        let provider = ScriptedProvider::new(vec![
            Ok("{\"topic\": \"first attempt, missing everything\"}".into()),
            Ok(valid_paper_json("Second Attempt")),
        ]);
        let outcome = generate_document(&provider, "p", "m", 3).await.unwrap();
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.document.title, "Second Attempt");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausts_bound_then_fails_terminally() {
        let provider = ScriptedProvider::new(vec![
            Ok("not json".into()),
            Ok("still not json".into()),
            Ok("{}".into()),
        ]);
        let err = generate_document(&provider, "p", "m", 3).await.unwrap_err();
        match err {
            PaperForgeError::GenerationFailed { attempts } => assert_eq!(attempts, 3),
            other => panic!("expected GenerationFailed, got {other}"),
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(PaperForgeError::Generation(
            "HTTP 429".into(),
        ))]);
        let err = generate_document(&provider, "p", "m", 3).await.unwrap_err();
        assert!(matches!(err, PaperForgeError::Generation(_)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn zero_attempt_bound_exhausts_without_calling() {
        let provider = ScriptedProvider::new(vec![]);
        let err = generate_document(&provider, "p", "m", 0).await.unwrap_err();
        assert!(matches!(
            err,
            PaperForgeError::GenerationFailed { attempts: 0 }
        ));
        assert_eq!(provider.call_count(), 0);
    }
}
