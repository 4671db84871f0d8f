//! Search-provider collaborators.
//!
//! The research stage depends only on the [`GeneralSearch`] and
//! [`AcademicSearch`] traits; the reqwest-backed clients live in
//! [`tavily`] and [`scholar`]. Raw result types mirror each provider's wire
//! format — normalization into evidence items happens in the research stage,
//! never here.

pub mod scholar;
pub mod tavily;

use async_trait::async_trait;
use serde::Deserialize;

/// Error type for search-provider calls.
///
/// A missing API key is deliberately a per-call error rather than a
/// construction failure: the caller treats it exactly like any other
/// provider failure (log, contribute zero results, fall back where a
/// fallback is defined).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Result type for search-provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Raw result from the general web-search provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Raw result from the academic-literature provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcademicResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub publication_info: Option<PublicationInfo>,
}

/// Citation metadata attached to an academic result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicationInfo {
    /// Free-text citation summary, e.g. `"J Doe, A Smith - Nature, 2021"`.
    #[serde(default)]
    pub summary: Option<String>,
}

/// General-purpose web search.
#[async_trait]
pub trait GeneralSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32)
        -> ProviderResult<Vec<GeneralResult>>;
}

/// Scholarly literature search.
#[async_trait]
pub trait AcademicSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32)
        -> ProviderResult<Vec<AcademicResult>>;
}
