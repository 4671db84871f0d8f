//! Text-completion collaborator boundary.
//!
//! The pipeline always sends one self-contained prompt and expects one text
//! response — no conversation memory. The trait exists so stages can be
//! exercised against scripted fakes; [`RigCompleter`] is the production
//! implementation over an OpenAI-compatible endpoint.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

/// Type alias for agents built from OpenAI-compatible endpoints.
pub type OaiAgent = Agent<openai::completion::CompletionModel>;

/// One self-contained prompt in, one text response out.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// rig-backed completer over an OpenAI-compatible chat-completions endpoint.
///
/// Temperature 0 — stage prompts ask for structured output and determinism
/// matters more than variety.
pub struct RigCompleter {
    agent: OaiAgent,
}

impl RigCompleter {
    pub fn new(client: &openai::CompletionsClient, model: &str) -> Self {
        let agent = client.agent(model).temperature(0.0).build();
        Self { agent }
    }
}

#[async_trait]
impl TextCompletion for RigCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response: String = self
            .agent
            .prompt(prompt)
            .await
            .map_err(|e| anyhow!("inference request failed: {e}"))?;
        Ok(response)
    }
}

/// Strip markdown code fences from a model response.
fn strip_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Extract the outermost JSON array from a model response.
///
/// Strips markdown fences, then slices from the first `[` to the last `]`.
/// Returns the stripped text unchanged when no bracket pair is found, so the
/// caller's decode still fails with a useful error.
pub fn extract_json_array(raw: &str) -> String {
    let stripped = strip_fences(raw);
    if let (Some(start), Some(end)) = (stripped.find('['), stripped.rfind(']')) {
        if start < end {
            return stripped[start..=end].to_string();
        }
    }
    stripped.to_string()
}

/// Extract the outermost JSON object from a model response.
pub fn extract_json_object(raw: &str) -> String {
    let stripped = strip_fences(raw);
    if let (Some(start), Some(end)) = (stripped.find('{'), stripped.rfind('}')) {
        if start < end {
            return stripped[start..=end].to_string();
        }
    }
    stripped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_array_plain() {
        let raw = r#"["query1", "query2"]"#;
        assert_eq!(extract_json_array(raw), r#"["query1", "query2"]"#);
    }

    #[test]
    fn test_extract_array_strips_markdown_fence() {
        let raw = "```json\n[\"a\", \"b\"]\n```";
        assert_eq!(extract_json_array(raw), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_extract_array_ignores_surrounding_prose() {
        let raw = "Here are the queries: [\"a\", \"b\"] — good luck.";
        assert_eq!(extract_json_array(raw), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_extract_array_passes_through_when_absent() {
        let raw = "no brackets here";
        assert_eq!(extract_json_array(raw), "no brackets here");
    }

    #[test]
    fn test_extract_object_with_fence_and_prose() {
        let raw = "Sure.\n```json\n{\"critique\": \"x\", \"action\": \"REWRITE\"}\n```";
        assert_eq!(
            extract_json_object(raw),
            "{\"critique\": \"x\", \"action\": \"REWRITE\"}"
        );
    }

    #[test]
    fn test_extract_object_keeps_nested_braces() {
        let raw = "{\"a\": {\"b\": 1}}";
        assert_eq!(extract_json_object(raw), "{\"a\": {\"b\": 1}}");
    }
}
