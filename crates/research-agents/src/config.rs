//! Runtime configuration: the completion endpoint, provider credentials, and
//! per-session knobs.
//!
//! Endpoint settings come from the environment with documented defaults; the
//! per-session [`SessionConfig`] is supplied by the caller and read-only for
//! the lifetime of a session.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rig::providers::openai;
use serde::{Deserialize, Serialize};

/// Which search provider family a session consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// General-purpose web search.
    #[default]
    General,
    /// Scholarly literature search, with per-query fallback to general.
    Academic,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Academic => write!(f, "academic"),
        }
    }
}

/// Inline citation style requested from the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum CitationStyle {
    /// Numeric bracket citations: `[1]`, `[2]`.
    #[default]
    Ieee,
    /// Author-date citations: `(Author, Year)`.
    Apa,
    /// BibTeX key citations: `\cite{key}`.
    Bibtex,
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ieee => write!(f, "IEEE"),
            Self::Apa => write!(f, "APA"),
            Self::Bibtex => write!(f, "BibTeX"),
        }
    }
}

/// Read-only per-session knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub search_mode: SearchMode,
    pub citation_style: CitationStyle,
    /// Results requested per search query.
    pub max_results: u32,
    /// Inclusive cap on writer invocations before forced approval.
    pub max_revisions: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::General,
            citation_style: CitationStyle::Ieee,
            max_results: 3,
            max_revisions: 2,
        }
    }
}

/// OpenAI-compatible completion endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmEndpoint {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

/// Top-level configuration, resolved from the environment.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Completion endpoint (Gemini's OpenAI-compatible API by default).
    pub llm: LlmEndpoint,
    /// Tavily key for the general web-search provider.
    pub tavily_api_key: Option<String>,
    /// SerpAPI key for the Google Scholar academic provider.
    pub serpapi_api_key: Option<String>,
    /// Where finished sessions are persisted.
    pub history_file: PathBuf,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            llm: LlmEndpoint {
                url: std::env::var("RESEARCH_LLM_URL").unwrap_or_else(|_| {
                    "https://generativelanguage.googleapis.com/v1beta/openai".into()
                }),
                api_key: std::env::var("RESEARCH_LLM_API_KEY")
                    .or_else(|_| std::env::var("GEMINI_API_KEY"))
                    .unwrap_or_default(),
                model: std::env::var("RESEARCH_LLM_MODEL")
                    .unwrap_or_else(|_| "gemini-2.5-flash".into()),
            },
            tavily_api_key: std::env::var("TAVILY_API_KEY").ok(),
            serpapi_api_key: std::env::var("SERPAPI_API_KEY").ok(),
            history_file: std::env::var("RESEARCH_HISTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("research_history.json")),
        }
    }
}

impl ResearchConfig {
    /// Build the rig completion client for the configured endpoint.
    pub fn completion_client(&self) -> Result<openai::CompletionsClient> {
        openai::CompletionsClient::builder()
            .api_key(&self.llm.api_key)
            .base_url(&self.llm.url)
            .build()
            .context("Failed to build completion client")
    }
}
