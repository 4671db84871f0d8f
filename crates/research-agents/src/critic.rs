//! Critic stage: review the draft and emit feedback plus a verdict.
//!
//! Two guards run before any LLM call: the revision cap forces approval
//! (the loop's one authoritative exit guard), and an empty draft is sent
//! straight back for a rewrite. Malformed verdict JSON never fails the
//! stage — the raw response is preserved as the critique for diagnosis.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::llm::{extract_json_object, TextCompletion};
use crate::prompts;
use crate::state::{StateUpdate, Verdict};

/// Fixed critique once the revision cap is exceeded.
pub const MAX_REVISIONS_MESSAGE: &str = "Max revisions reached. Auto-approved.";

/// Fixed critique when the writer produced nothing to review.
pub const NO_DRAFT_MESSAGE: &str = "No draft found.";

#[derive(Debug, Deserialize)]
struct CritiqueResponse {
    #[serde(default = "default_critique")]
    critique: String,
    #[serde(default)]
    action: String,
}

fn default_critique() -> String {
    "No critique provided.".to_string()
}

/// Run the critic stage.
pub async fn critique(
    draft: &str,
    revision_count: u32,
    max_revisions: u32,
    llm: &dyn TextCompletion,
) -> Result<StateUpdate> {
    if revision_count > max_revisions {
        info!(revision_count, max_revisions, "revision cap exceeded — forcing approval");
        return Ok(verdict_update(
            MAX_REVISIONS_MESSAGE.to_string(),
            Verdict::Approve,
        ));
    }

    if draft.is_empty() {
        return Ok(verdict_update(NO_DRAFT_MESSAGE.to_string(), Verdict::Rewrite));
    }

    let raw = llm
        .complete(&prompts::review(draft))
        .await
        .context("critic stage inference failed")?;
    debug!(chars = raw.len(), "critic raw response");

    match serde_json::from_str::<CritiqueResponse>(&extract_json_object(&raw)) {
        Ok(response) => {
            let verdict = Verdict::parse(&response.action);
            Ok(verdict_update(response.critique, verdict))
        }
        Err(e) => {
            warn!(error = %e, "critique response not parseable — preserving raw text");
            Ok(verdict_update(raw, Verdict::Rewrite))
        }
    }
}

fn verdict_update(critique: String, verdict: Verdict) -> StateUpdate {
    StateUpdate {
        critique: Some(critique),
        verdict: Some(verdict),
        ..StateUpdate::default()
    }
}
