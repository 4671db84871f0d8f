//! Pipeline state machine — explicit states and legal transition guards.
//!
//! The orchestrator loop calls `advance()` to move between stages. Each call
//! validates the transition against the state graph and records it in the
//! transition log, so a finished session can be replayed from its log.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// The set of pipeline states.
///
/// Every run starts at `Researching` and terminates at either `Complete` or
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Generating queries and gathering evidence.
    Researching,
    /// Drafting the report from accumulated evidence.
    Writing,
    /// Reviewing the draft and deciding the next step.
    Critiquing,
    /// Draft approved — terminal state.
    Complete,
    /// Stage error or cancellation — terminal state.
    Failed,
}

impl PipelineState {
    /// Whether this is a terminal state (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Researching => write!(f, "Researching"),
            Self::Writing => write!(f, "Writing"),
            Self::Critiquing => write!(f, "Critiquing"),
            Self::Complete => write!(f, "Complete"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Legal transitions between pipeline states.
///
/// ```text
/// Researching → Writing | Failed
/// Writing     → Critiquing | Failed
/// Critiquing  → Researching | Writing | Complete | Failed
/// ```
fn is_legal_transition(from: PipelineState, to: PipelineState) -> bool {
    use PipelineState::*;

    // Any non-terminal state can transition to Failed.
    if to == Failed && !from.is_terminal() {
        return true;
    }

    matches!(
        (from, to),
        (Researching, Writing)
            | (Writing, Critiquing)
            // After critiquing: gather more, rewrite, or accept
            | (Critiquing, Researching)
            | (Critiquing, Writing)
            | (Critiquing, Complete)
    )
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: PipelineState,
    pub to: PipelineState,
    /// Revision count at the time of transition (0 before the first draft).
    pub revision: u32,
    /// Milliseconds since the state machine was created.
    pub elapsed_ms: u64,
    /// Optional context about why this transition happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted.
#[derive(Debug, Clone)]
pub struct IllegalTransition {
    pub from: PipelineState,
    pub to: PipelineState,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal state transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// The pipeline state machine.
///
/// Tracks the current state, enforces legal transitions, and maintains a
/// complete log of all transitions for diagnostics.
pub struct StateMachine {
    current: PipelineState,
    revision: u32,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl StateMachine {
    /// Create a new state machine starting at `Researching`.
    pub fn new() -> Self {
        Self {
            current: PipelineState::Researching,
            revision: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    /// Set the revision counter (called by the orchestrator after each
    /// writer pass).
    pub fn set_revision(&mut self, revision: u32) {
        self.revision = revision;
    }

    /// Attempt to advance to the next state.
    ///
    /// Returns `Err(IllegalTransition)` if the transition would violate the
    /// state graph.
    pub fn advance(
        &mut self,
        to: PipelineState,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            revision: self.revision,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        };

        tracing::debug!(
            from = %self.current,
            to = %to,
            revision = self.revision,
            "State transition"
        );

        self.transitions.push(record);
        self.current = to;
        Ok(())
    }

    /// Transition to `Failed` from any non-terminal state.
    pub fn fail(&mut self, reason: &str) -> Result<(), IllegalTransition> {
        self.advance(PipelineState::Failed, Some(reason))
    }

    /// Whether the state machine is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Get the full transition log.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Get a summary string of the state machine's history.
    pub fn summary(&self) -> String {
        let states: Vec<String> = self.transitions.iter().map(|t| t.to.to_string()).collect();
        format!(
            "{} → {} ({}ms, {} transitions)",
            PipelineState::Researching,
            self.current,
            self.created_at.elapsed().as_millis(),
            self.transitions.len(),
        ) + if states.is_empty() {
            String::new()
        } else {
            format!(" [{}]", states.join(" → "))
        }
        .as_str()
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
