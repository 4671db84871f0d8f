//! Research stage: query generation, provider fan-out, normalization.
//!
//! The stage turns the task (and the latest critique, when one exists) into
//! search queries, dispatches them concurrently, and normalizes raw provider
//! results into evidence items. Failures degrade per query: a query that
//! cannot be served contributes zero items, and the stage returns whatever
//! was collected.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use regex::Regex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{SearchMode, SessionConfig};
use crate::llm::{extract_json_array, TextCompletion};
use crate::prompts;
use crate::providers::{AcademicResult, AcademicSearch, GeneralResult, GeneralSearch};
use crate::state::{EvidenceItem, StateUpdate};

/// Upper bound on concurrently running search queries.
const MAX_PARALLEL_QUERIES: usize = 4;

/// The search collaborators the stage fans out to.
///
/// The academic provider is optional: when absent, academic-mode queries go
/// straight to the general provider, the same path taken when the academic
/// call fails.
#[derive(Clone)]
pub struct SearchSet {
    pub general: Arc<dyn GeneralSearch>,
    pub academic: Option<Arc<dyn AcademicSearch>>,
}

/// Run the research stage.
///
/// Returns an update that appends evidence; it never replaces prior
/// evidence. The update may carry zero items when every query failed.
pub async fn research(
    task: &str,
    critique: Option<&str>,
    config: &SessionConfig,
    llm: &dyn TextCompletion,
    search: &SearchSet,
    cancel: &CancellationToken,
) -> Result<StateUpdate> {
    let queries = generate_queries(llm, task, critique, config.search_mode).await;
    info!(count = queries.len(), mode = %config.search_mode, "dispatching search queries");

    let sem = Arc::new(Semaphore::new(MAX_PARALLEL_QUERIES));
    let mut join_set: JoinSet<(usize, Vec<EvidenceItem>)> = JoinSet::new();

    for (index, query) in queries.into_iter().enumerate() {
        let sem = sem.clone();
        let search = search.clone();
        let mode = config.search_mode;
        let max_results = config.max_results;

        join_set.spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            let items = run_query(&query, mode, max_results, &search).await;
            (index, items)
        });
    }

    let mut collected: Vec<(usize, Vec<EvidenceItem>)> = Vec::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("research cancelled — returning partial evidence");
                join_set.abort_all();
                break;
            }
            next = join_set.join_next() => match next {
                Some(Ok(entry)) => collected.push(entry),
                Some(Err(e)) if e.is_cancelled() => {}
                Some(Err(e)) => warn!(error = %e, "search task panicked"),
                None => break,
            },
        }
    }

    // Merge in query-submission order so output is stable regardless of
    // which query finished first.
    collected.sort_by_key(|(index, _)| *index);
    let evidence: Vec<EvidenceItem> = collected
        .into_iter()
        .flat_map(|(_, items)| items)
        .collect();
    info!(count = evidence.len(), "research stage collected evidence");

    Ok(StateUpdate {
        evidence,
        ..StateUpdate::default()
    })
}

/// Ask the LLM for search queries.
///
/// Never raises: a transport failure, malformed JSON, or an empty list all
/// fall back to the task itself as the sole query.
async fn generate_queries(
    llm: &dyn TextCompletion,
    task: &str,
    critique: Option<&str>,
    mode: SearchMode,
) -> Vec<String> {
    let prompt = match critique.filter(|c| !c.is_empty()) {
        Some(critique) => prompts::targeted_queries(task, critique),
        None => match mode {
            SearchMode::Academic => prompts::scholarly_queries(task),
            SearchMode::General => prompts::broad_queries(task),
        },
    };

    let raw = match llm.complete(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "query generation call failed — falling back to the task itself");
            return vec![task.to_string()];
        }
    };

    match serde_json::from_str::<Vec<String>>(&extract_json_array(&raw)) {
        Ok(queries) if !queries.is_empty() => queries,
        Ok(_) => {
            warn!("query generation returned an empty list — falling back to the task itself");
            vec![task.to_string()]
        }
        Err(e) => {
            warn!(error = %e, "query generation returned malformed JSON — falling back to the task itself");
            vec![task.to_string()]
        }
    }
}

/// Serve one query, falling back from academic to general where defined.
///
/// Provider failures are isolated here: the query contributes zero items and
/// the stage carries on.
async fn run_query(
    query: &str,
    mode: SearchMode,
    max_results: u32,
    search: &SearchSet,
) -> Vec<EvidenceItem> {
    if mode == SearchMode::Academic {
        match &search.academic {
            Some(academic) => match academic.search(query, max_results).await {
                Ok(results) if !results.is_empty() => {
                    return results.into_iter().map(normalize_academic).collect();
                }
                Ok(_) => {
                    debug!(query, "academic search returned nothing — falling back to general");
                }
                Err(e) => {
                    warn!(query, error = %e, "academic search failed — falling back to general");
                }
            },
            None => {
                debug!(query, "academic provider not configured — falling back to general");
            }
        }
    }

    match search.general.search(query, max_results).await {
        Ok(results) => results.into_iter().map(normalize_general).collect(),
        Err(e) => {
            warn!(query, error = %e, "search failed — query contributes no evidence");
            Vec::new()
        }
    }
}

fn normalize_general(result: GeneralResult) -> EvidenceItem {
    let year = result
        .published_date
        .filter(|date| !date.is_empty())
        .map(|date| date.chars().take(4).collect());
    EvidenceItem::from_parts(result.title, year, result.author, result.url, result.content)
}

fn normalize_academic(result: AcademicResult) -> EvidenceItem {
    let summary = result
        .publication_info
        .and_then(|info| info.summary)
        .unwrap_or_default();
    let year = year_from_summary(&summary);
    let author = author_from_summary(&summary)
        .unwrap_or_else(|| "Unknown Author".to_string());
    EvidenceItem::from_parts(result.title, year, Some(author), result.link, result.snippet)
}

/// First 4-digit run in the citation summary that looks like a year.
fn year_from_summary(summary: &str) -> Option<String> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let pattern = YEAR.get_or_init(|| Regex::new(r"(19|20)\d{2}").expect("valid year pattern"));
    pattern.find(summary).map(|m| m.as_str().to_string())
}

/// Text before the first hyphen in the citation summary, trimmed.
///
/// Hyphenated author names misparse; that is accepted behavior.
fn author_from_summary(summary: &str) -> Option<String> {
    let head = summary.split('-').next().unwrap_or("").trim();
    if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    }
}
