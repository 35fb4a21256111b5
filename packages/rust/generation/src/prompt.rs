//! Prompt assembly: a pure function from (topic, context) to the final
//! prompt string, embedding the fixed JSON output schema.

use paperforge_shared::{PaperForgeError, Result};

/// Role and formatting instructions, including the exact JSON skeleton the
/// response must match. Key order mirrors the rendering order.
const SYSTEM_PROMPT: &str = r#"You are an expert academic researcher tasked with generating a comprehensive research paper.
Create a detailed academic paper following standard research paper structure and academic writing conventions.
Respond with valid JSON only, no prose before or after, matching this structure exactly (keys must match):
{
    "topic": "",
    "abstract": "",
    "introduction": "",
    "literature_review": "",
    "methodology": "",
    "analysis_and_findings": "",
    "discussion": "",
    "future_research": "",
    "conclusion": "",
    "sources": [],
    "tools_used": []
}

Every section field must contain substantial, academic-quality prose. "sources" is a list of citation strings (URLs where available)."#;

/// Build the full generation prompt for one run.
///
/// Pure: no I/O, no clock, no randomness. Fails only when the topic is empty
/// or whitespace.
pub fn build_prompt(topic: &str, context: &str) -> Result<String> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(PaperForgeError::validation("research topic must not be empty"));
    }

    let context_block = if context.trim().is_empty() {
        "No external source material was available for this topic; rely on your own knowledge \
         and cite well-known publications."
            .to_string()
    } else {
        format!("Source material gathered for this topic:\n\n{context}")
    };

    Ok(format!(
        "{SYSTEM_PROMPT}\n\nUser query: {topic}\n\n{context_block}\n\n\
         Using the above source material where relevant, produce the full research paper \
         as a single JSON object following the schema exactly."
    ))
}
