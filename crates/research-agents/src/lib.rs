//! Iterative research-report pipeline.
//!
//! A free-text topic goes through a bounded loop of three stages:
//! research (gather evidence), write (draft a cited report), critique
//! (verdict + feedback). The critic's verdict routes the next step —
//! more research, a rewrite, or termination — and a revision cap
//! guarantees the loop halts.
//!
//! Module map:
//! - [`state`]: session state, evidence items, verdicts, merge semantics.
//! - [`state_machine`]: typed pipeline states with legal-transition guards.
//! - [`researcher`] / [`writer`] / [`critic`]: the three stages.
//! - [`orchestrator`]: the loop driver and routing policy.
//! - [`providers`]: search collaborator traits and reqwest-backed clients.
//! - [`llm`]: text-completion collaborator trait and the rig-backed client.
//! - [`config`]: env-driven runtime configuration and session knobs.
//! - [`prompts`]: versioned prompt templates for each stage.

pub mod config;
pub mod critic;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod researcher;
pub mod state;
pub mod state_machine;
pub mod writer;
