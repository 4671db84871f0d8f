//! Orchestration loop: research → write → critique, routed by verdict.
//!
//! The orchestrator owns the session state and its merge step; stages return
//! partial updates and never mutate state directly. Termination is
//! guaranteed by composition: the critic forces APPROVE once the revision
//! cap is exceeded, and `route` maps APPROVE to Terminal unconditionally —
//! the orchestrator itself re-checks nothing.

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use history::{HistoryStore, NewSession};

use crate::config::SessionConfig;
use crate::critic;
use crate::llm::TextCompletion;
use crate::researcher::{self, SearchSet};
use crate::state::{SessionState, Verdict};
use crate::state_machine::{PipelineState, StateMachine};
use crate::writer;

/// Next pipeline step chosen after a critique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Researcher,
    Writer,
    Terminal,
}

/// Deterministic routing from the critic's verdict to the next step.
///
/// The sole place loop continuation is decided; it consults no other state,
/// so the same verdict always routes identically.
pub fn route(verdict: Verdict) -> NextStep {
    match verdict {
        Verdict::Approve => NextStep::Terminal,
        Verdict::ResearchMore => NextStep::Researcher,
        Verdict::Rewrite => NextStep::Writer,
    }
}

/// Drives one research session through the stage loop.
pub struct Orchestrator {
    llm: Arc<dyn TextCompletion>,
    search: SearchSet,
    config: SessionConfig,
    history: Option<Arc<dyn HistoryStore>>,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn TextCompletion>, search: SearchSet, config: SessionConfig) -> Self {
        Self {
            llm,
            search,
            config,
            history: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Persist finished sessions to the given store.
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Propagate an external cancellation token into the session.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run a session to a terminal state.
    ///
    /// Returns the final session state on success. A stage failure with no
    /// defined fallback drives the machine to `Failed` and surfaces here as
    /// an error; nothing is persisted in that case.
    pub async fn run_session(&self, task: &str) -> Result<SessionState> {
        let mut state = SessionState::new(task);
        let mut machine = StateMachine::new();
        info!(task, mode = %self.config.search_mode, style = %self.config.citation_style, "session starting");

        loop {
            match machine.current() {
                PipelineState::Researching => {
                    let critique = state.critique.clone();
                    let critique = (!critique.is_empty()).then_some(critique.as_str());
                    match researcher::research(
                        &state.task,
                        critique,
                        &self.config,
                        self.llm.as_ref(),
                        &self.search,
                        &self.cancel,
                    )
                    .await
                    {
                        Ok(update) => {
                            let gathered = update.evidence.len();
                            state.apply(update);
                            machine.advance(
                                PipelineState::Writing,
                                Some(&format!("{gathered} evidence items gathered")),
                            )?;
                        }
                        Err(e) => return self.abort(&mut machine, e.context("research stage failed")),
                    }
                }
                PipelineState::Writing => {
                    match writer::write(
                        &state.task,
                        &state.evidence,
                        self.config.citation_style,
                        self.llm.as_ref(),
                    )
                    .await
                    {
                        Ok(update) => {
                            state.apply(update);
                            machine.set_revision(state.revision_count);
                            machine.advance(PipelineState::Critiquing, None)?;
                        }
                        Err(e) => return self.abort(&mut machine, e.context("writer stage failed")),
                    }
                }
                PipelineState::Critiquing => {
                    match critic::critique(
                        &state.draft,
                        state.revision_count,
                        self.config.max_revisions,
                        self.llm.as_ref(),
                    )
                    .await
                    {
                        Ok(update) => {
                            state.apply(update);
                            info!(verdict = %state.last_verdict, revision = state.revision_count, "critique verdict");
                            match route(state.last_verdict) {
                                NextStep::Terminal => machine
                                    .advance(PipelineState::Complete, Some("draft approved"))?,
                                NextStep::Researcher => machine.advance(
                                    PipelineState::Researching,
                                    Some("more research requested"),
                                )?,
                                NextStep::Writer => machine
                                    .advance(PipelineState::Writing, Some("rewrite requested"))?,
                            }
                        }
                        Err(e) => return self.abort(&mut machine, e.context("critic stage failed")),
                    }
                }
                PipelineState::Complete => {
                    self.persist(&state);
                    info!(
                        revisions = state.revision_count,
                        evidence = state.evidence.len(),
                        summary = %machine.summary(),
                        "session complete"
                    );
                    return Ok(state);
                }
                PipelineState::Failed => {
                    bail!("session entered failed state: {}", machine.summary());
                }
            }

            // A cancellation observed between stages ends the run; the stage
            // that was in flight has already merged its partial output.
            if self.cancel.is_cancelled() {
                let _ = machine.fail("session cancelled");
                bail!("session cancelled");
            }
        }
    }

    fn abort(&self, machine: &mut StateMachine, error: anyhow::Error) -> Result<SessionState> {
        if let Err(e) = machine.fail(&error.to_string()) {
            warn!(error = %e, "could not record failure transition");
        }
        Err(error)
    }

    /// Hand the finished (task, draft, evidence) triple to the history store.
    ///
    /// Only called at Terminal; an append failure degrades to a warning —
    /// the report itself already exists.
    fn persist(&self, state: &SessionState) {
        let Some(store) = &self.history else {
            return;
        };
        if state.draft.is_empty() {
            warn!("terminal state with empty draft — nothing persisted");
            return;
        }

        let evidence = state
            .evidence
            .iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect();
        let session = NewSession {
            task: state.task.clone(),
            draft: state.draft.clone(),
            evidence,
            search_mode: self.config.search_mode.to_string(),
            citation_style: self.config.citation_style.to_string(),
        };

        match store.append(session) {
            Ok(record) => info!(id = %record.id, "session persisted to history"),
            Err(e) => warn!(error = %e, "failed to persist session history"),
        }
    }
}
