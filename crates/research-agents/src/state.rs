//! Session state threaded through the pipeline loop.
//!
//! The state is a caller-owned accumulator: each stage returns a partial
//! [`StateUpdate`] and the orchestrator merges it via [`SessionState::apply`].
//! Evidence accumulates across loop iterations; every other field is replaced
//! by the latest stage that produced it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One normalized retrieved source, used as writer context and citation
/// material.
///
/// Constructed only through [`EvidenceItem::from_parts`] so every field is
/// always present — defaults are substituted centrally and no call site can
/// produce a partially-populated record. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub title: String,
    /// 4-digit year or the sentinel `"n.d."`.
    pub year: String,
    pub author: String,
    /// URL or opaque source identifier.
    pub source: String,
    /// Snippet text, possibly empty.
    pub content: String,
}

impl EvidenceItem {
    /// Build an item from possibly-missing raw provider fields, substituting
    /// defaults for anything absent.
    pub fn from_parts(
        title: Option<String>,
        year: Option<String>,
        author: Option<String>,
        source: Option<String>,
        content: Option<String>,
    ) -> Self {
        Self {
            title: title.unwrap_or_else(|| "Unknown Title".to_string()),
            year: year.unwrap_or_else(|| "n.d.".to_string()),
            author: author.unwrap_or_else(|| "Unknown".to_string()),
            source: source.unwrap_or_else(|| "Unknown Source".to_string()),
            content: content.unwrap_or_default(),
        }
    }
}

/// The critic's categorical decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Draft is complete — terminate the loop.
    Approve,
    /// Draft is missing facts or citations — gather more evidence.
    ResearchMore,
    /// Facts are there but the writing needs another pass.
    #[default]
    Rewrite,
}

impl Verdict {
    /// Total decode of a free-form verdict string.
    ///
    /// Any unrecognized value maps to `Rewrite` — never a failure.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "APPROVE" => Self::Approve,
            "RESEARCH_MORE" => Self::ResearchMore,
            _ => Self::Rewrite,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "APPROVE"),
            Self::ResearchMore => write!(f, "RESEARCH_MORE"),
            Self::Rewrite => write!(f, "REWRITE"),
        }
    }
}

/// The accumulating record of one research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// The user's topic. Set once, never mutated.
    pub task: String,
    /// Append-only across iterations; length is monotonically non-decreasing.
    pub evidence: Vec<EvidenceItem>,
    /// Current report text, fully replaced on each writer invocation.
    pub draft: String,
    /// Latest critic feedback, fully replaced on each critic invocation.
    pub critique: String,
    /// Number of completed writer invocations.
    pub revision_count: u32,
    pub last_verdict: Verdict,
}

impl SessionState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            evidence: Vec::new(),
            draft: String::new(),
            critique: String::new(),
            revision_count: 0,
            last_verdict: Verdict::default(),
        }
    }

    /// Merge a stage's partial output.
    ///
    /// Evidence appends; every other field replaces when the update carries a
    /// value. This is the single merge point — stages never touch the state
    /// directly.
    pub fn apply(&mut self, update: StateUpdate) {
        self.evidence.extend(update.evidence);
        if let Some(draft) = update.draft {
            self.draft = draft;
        }
        if let Some(critique) = update.critique {
            self.critique = critique;
        }
        self.revision_count += update.revision_increment;
        if let Some(verdict) = update.verdict {
            self.last_verdict = verdict;
        }
    }
}

/// A stage's partial output, merged into [`SessionState`] by the
/// orchestrator.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    /// Appended to the session's evidence.
    pub evidence: Vec<EvidenceItem>,
    pub draft: Option<String>,
    pub critique: Option<String>,
    pub revision_increment: u32,
    pub verdict: Option<Verdict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> EvidenceItem {
        EvidenceItem::from_parts(
            Some(title.to_string()),
            Some("2023".to_string()),
            Some("Doe".to_string()),
            Some("https://example.com".to_string()),
            Some("snippet".to_string()),
        )
    }

    #[test]
    fn test_from_parts_substitutes_all_defaults() {
        let item = EvidenceItem::from_parts(None, None, None, None, None);
        assert_eq!(item.title, "Unknown Title");
        assert_eq!(item.year, "n.d.");
        assert_eq!(item.author, "Unknown");
        assert_eq!(item.source, "Unknown Source");
        assert_eq!(item.content, "");
    }

    #[test]
    fn test_from_parts_keeps_present_fields() {
        let item = item("Solid State Batteries");
        assert_eq!(item.title, "Solid State Batteries");
        assert_eq!(item.year, "2023");
        assert_eq!(item.author, "Doe");
    }

    #[test]
    fn test_verdict_parse_known_values() {
        assert_eq!(Verdict::parse("APPROVE"), Verdict::Approve);
        assert_eq!(Verdict::parse("RESEARCH_MORE"), Verdict::ResearchMore);
        assert_eq!(Verdict::parse("REWRITE"), Verdict::Rewrite);
        assert_eq!(Verdict::parse("  APPROVE  "), Verdict::Approve);
    }

    #[test]
    fn test_verdict_parse_is_total() {
        assert_eq!(Verdict::parse("SHIP_IT"), Verdict::Rewrite);
        assert_eq!(Verdict::parse(""), Verdict::Rewrite);
        assert_eq!(Verdict::parse("approve"), Verdict::Rewrite);
    }

    #[test]
    fn test_verdict_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&Verdict::ResearchMore).unwrap();
        assert_eq!(json, "\"RESEARCH_MORE\"");
        let back: Verdict = serde_json::from_str("\"APPROVE\"").unwrap();
        assert_eq!(back, Verdict::Approve);
    }

    #[test]
    fn test_apply_appends_evidence() {
        let mut state = SessionState::new("topic");
        state.apply(StateUpdate {
            evidence: vec![item("a"), item("b")],
            ..StateUpdate::default()
        });
        state.apply(StateUpdate {
            evidence: vec![item("c")],
            ..StateUpdate::default()
        });

        // Accumulates, never overwrites.
        assert_eq!(state.evidence.len(), 3);
        assert_eq!(state.evidence[0].title, "a");
        assert_eq!(state.evidence[2].title, "c");
    }

    #[test]
    fn test_apply_replaces_scalar_fields() {
        let mut state = SessionState::new("topic");
        state.apply(StateUpdate {
            draft: Some("v1".to_string()),
            revision_increment: 1,
            ..StateUpdate::default()
        });
        state.apply(StateUpdate {
            draft: Some("v2".to_string()),
            critique: Some("tighten the intro".to_string()),
            revision_increment: 1,
            verdict: Some(Verdict::Approve),
            ..StateUpdate::default()
        });

        assert_eq!(state.draft, "v2");
        assert_eq!(state.critique, "tighten the intro");
        assert_eq!(state.revision_count, 2);
        assert_eq!(state.last_verdict, Verdict::Approve);
    }

    #[test]
    fn test_apply_without_values_leaves_fields_untouched() {
        let mut state = SessionState::new("topic");
        state.apply(StateUpdate {
            draft: Some("kept".to_string()),
            verdict: Some(Verdict::ResearchMore),
            ..StateUpdate::default()
        });
        state.apply(StateUpdate::default());

        assert_eq!(state.draft, "kept");
        assert_eq!(state.last_verdict, Verdict::ResearchMore);
        assert_eq!(state.revision_count, 0);
    }

    #[test]
    fn test_new_session_defaults() {
        let state = SessionState::new("topic");
        assert_eq!(state.task, "topic");
        assert_eq!(state.revision_count, 0);
        assert_eq!(state.last_verdict, Verdict::Rewrite);
        assert!(state.evidence.is_empty());
        assert!(state.draft.is_empty());
    }
}
