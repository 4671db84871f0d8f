use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use history::{HistoryStore, JsonHistoryStore};
use research_agents::config::{CitationStyle, ResearchConfig, SearchMode, SessionConfig};
use research_agents::llm::RigCompleter;
use research_agents::orchestrator::Orchestrator;
use research_agents::providers::scholar::ScholarClient;
use research_agents::providers::tavily::TavilyClient;
use research_agents::providers::AcademicSearch;
use research_agents::researcher::SearchSet;

#[derive(Parser)]
#[command(
    name = "research-agents",
    about = "Iterative research-report pipeline: research → write → critique"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Research a topic and write a cited report.
    Run {
        /// The topic to research.
        task: String,
        /// Search provider family to consult.
        #[arg(long, value_enum, default_value_t)]
        mode: SearchMode,
        /// Inline citation style for the report.
        #[arg(long, value_enum, default_value_t)]
        style: CitationStyle,
        /// Results requested per search query.
        #[arg(long, default_value_t = 3)]
        max_results: u32,
        /// Writer invocations allowed before forced approval.
        #[arg(long, default_value_t = 2)]
        max_revisions: u32,
        /// Skip persisting the finished session to history.
        #[arg(long)]
        no_history: bool,
    },
    /// Inspect or prune past sessions.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List stored sessions, newest first.
    List,
    /// Delete a stored session by id.
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ResearchConfig::default();

    match cli.command {
        Command::Run {
            task,
            mode,
            style,
            max_results,
            max_revisions,
            no_history,
        } => {
            let session = SessionConfig {
                search_mode: mode,
                citation_style: style,
                max_results,
                max_revisions,
            };
            run(config, task, session, no_history).await
        }
        Command::History { action } => history_command(&config, action),
    }
}

async fn run(
    config: ResearchConfig,
    task: String,
    session: SessionConfig,
    no_history: bool,
) -> Result<()> {
    report_credentials(&config, session.search_mode);

    let client = config.completion_client()?;
    let llm = Arc::new(RigCompleter::new(&client, &config.llm.model));
    let search = SearchSet {
        general: Arc::new(TavilyClient::new(config.tavily_api_key.clone())),
        academic: config
            .serpapi_api_key
            .clone()
            .map(|key| Arc::new(ScholarClient::new(Some(key))) as Arc<dyn AcademicSearch>),
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received — cancelling session");
                cancel.cancel();
            }
        });
    }

    let mut orchestrator =
        Orchestrator::new(llm, search, session).with_cancellation(cancel);
    if !no_history {
        orchestrator = orchestrator
            .with_history(Arc::new(JsonHistoryStore::new(&config.history_file)));
    }

    let state = orchestrator.run_session(&task).await?;
    println!("{}", state.draft);
    info!(
        evidence = state.evidence.len(),
        revisions = state.revision_count,
        "report finished"
    );
    Ok(())
}

/// Report which collaborator credentials are present.
///
/// Missing credentials are not fatal here — they degrade per the provider
/// failure rules — but the operator should know before a long run.
fn report_credentials(config: &ResearchConfig, mode: SearchMode) {
    if config.llm.api_key.is_empty() {
        warn!("no LLM API key configured (RESEARCH_LLM_API_KEY / GEMINI_API_KEY)");
    }
    if config.tavily_api_key.is_none() {
        warn!("TAVILY_API_KEY not set — general search will contribute no results");
    }
    if mode == SearchMode::Academic && config.serpapi_api_key.is_none() {
        warn!("SERPAPI_API_KEY not set — academic queries will fall back to general search");
    }
}

fn history_command(config: &ResearchConfig, action: HistoryAction) -> Result<()> {
    let store = JsonHistoryStore::new(&config.history_file);
    match action {
        HistoryAction::List => {
            let records = store.list()?;
            if records.is_empty() {
                println!("No stored sessions.");
                return Ok(());
            }
            for record in records {
                let preview: String = record.draft.chars().take(80).collect();
                println!(
                    "{}  {}  {}\n    {}",
                    record.id,
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    record.task,
                    preview,
                );
            }
            Ok(())
        }
        HistoryAction::Delete { id } => {
            if store.delete(&id)? {
                println!("Deleted {id}.");
            } else {
                println!("No session with id {id}.");
            }
            Ok(())
        }
    }
}
