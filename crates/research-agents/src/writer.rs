//! Writer stage: synthesize a draft report from accumulated evidence.
//!
//! Every invocation consumes a revision, including the degraded path where
//! no evidence was collected — a session with zero evidence still spends a
//! revision on the apology draft.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::CitationStyle;
use crate::llm::TextCompletion;
use crate::prompts;
use crate::state::{EvidenceItem, StateUpdate};

/// Draft substituted when the writer runs with no evidence.
pub const APOLOGY_DRAFT: &str =
    "Sorry, I could not find any relevant information to write a report.";

/// Run the writer stage.
///
/// Replaces the draft in full and increments the revision count by exactly 1
/// on every invocation. An LLM transport failure has no fallback here and
/// propagates as a run failure.
pub async fn write(
    task: &str,
    evidence: &[EvidenceItem],
    style: CitationStyle,
    llm: &dyn TextCompletion,
) -> Result<StateUpdate> {
    if evidence.is_empty() {
        warn!("no evidence collected — substituting apology draft");
        return Ok(StateUpdate {
            draft: Some(APOLOGY_DRAFT.to_string()),
            revision_increment: 1,
            ..StateUpdate::default()
        });
    }

    let context = render_context(evidence);
    let prompt = prompts::report(task, &context, style);
    let draft = llm
        .complete(&prompt)
        .await
        .context("writer stage inference failed")?;
    info!(chars = draft.len(), sources = evidence.len(), "writer produced draft");

    Ok(StateUpdate {
        draft: Some(draft),
        revision_increment: 1,
        ..StateUpdate::default()
    })
}

/// Render evidence into numbered context blocks for the writer prompt.
///
/// Numbers start at 1 to line up with IEEE-style `[n]` citations.
fn render_context(evidence: &[EvidenceItem]) -> String {
    let mut context = String::new();
    for (index, item) in evidence.iter().enumerate() {
        context.push_str(&format!(
            "[{}] {} ({})\nAuthor: {}\nSource: {}\nContent: {}\n\n",
            index + 1,
            item.title,
            item.year,
            item.author,
            item.source,
            item.content,
        ));
    }
    context
}
