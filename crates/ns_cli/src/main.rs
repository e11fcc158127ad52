use std::future::Future;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use ns_core::{EmbeddingService, Error, Result, VectorIndex, EMBEDDING_DIMENSION};
use ns_feeds::{init_logging, FeedNormalizer, HttpFetcher, IngestManager, IngestOutcome, Logger};
use ns_inference::{ModelKind, DEFAULT_EMBEDDING_URL, DEFAULT_MODEL_NAME};
use ns_storage::{create_index, IndexBackend, DEFAULT_CLOUD, DEFAULT_INDEX_NAME, DEFAULT_REGION};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod render;
mod search;
mod settings;

use search::QueryLoop;
use settings::{resolve_feeds, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about = "Semantic search over Slovak news feeds", long_about = None)]
pub struct Cli {
    /// Vector index backend
    #[arg(long, value_enum, env = "NS_INDEX_BACKEND", default_value_t = IndexBackend::Pinecone)]
    pub index_backend: IndexBackend,
    #[arg(long, env = "NS_INDEX_NAME", default_value = DEFAULT_INDEX_NAME)]
    pub index_name: String,
    #[arg(long, default_value = DEFAULT_CLOUD)]
    pub pinecone_cloud: String,
    #[arg(long, default_value = DEFAULT_REGION)]
    pub pinecone_region: String,
    #[arg(long, env = "QDRANT_URL")]
    pub qdrant_url: Option<String>,
    /// Embedding service implementation
    #[arg(long, value_enum, env = "NS_EMBEDDER", default_value_t = ModelKind::Http)]
    pub embedder: ModelKind,
    /// Base URL of an OpenAI-compatible embeddings API
    #[arg(long, env = "NS_EMBEDDING_URL", default_value = DEFAULT_EMBEDDING_URL)]
    pub embedding_url: String,
    #[arg(long, env = "NS_EMBEDDING_MODEL", default_value = DEFAULT_MODEL_NAME)]
    pub embedding_model: String,
    #[arg(long, default_value_t = EMBEDDING_DIMENSION)]
    pub dimension: usize,
    #[arg(long, default_value_t = ns_core::config::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Ingest only while the index holds fewer records than this
    #[arg(long, default_value_t = ns_core::config::DEFAULT_INGEST_THRESHOLD)]
    pub ingest_threshold: u64,
    #[arg(long, default_value_t = ns_core::config::DEFAULT_TOP_K)]
    pub top_k: usize,
    /// Per-feed fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub fetch_timeout: u64,
    /// Feed URL to ingest; repeat for several. Replaces the built-in list.
    #[arg(long = "feed")]
    pub feeds: Vec<String>,
    /// File with one feed URL per line, `#` starts a comment
    #[arg(long)]
    pub feeds_file: Option<PathBuf>,
    #[arg(short, long)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Ingest when the index is below the threshold, then search (default)
    Run,
    /// Fetch, embed and upsert all feeds
    Ingest {
        /// Ignore the record-count threshold
        #[arg(long)]
        force: bool,
    },
    /// Interactive search without ingesting
    Search,
    /// Run a single query and exit
    Query {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Print the index record count
    Stats,
    /// List the configured feed URLs
    Feeds,
}

/// Resolves to `Err(Error::UserAbort)` if Ctrl-C arrives first.
async fn interruptible<T>(task: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        result = task => result,
        _ = tokio::signal::ctrl_c() => Err(Error::UserAbort),
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the loop can still end on an exit word or EOF.
        std::future::pending::<()>().await;
    }
}

/// Operator lines from stdin, read on a plain thread. A blocking stdin read
/// cannot be cancelled, so it must stay off the runtime or shutdown waits
/// for the next Enter. The channel closes at end of input.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn ingest_manager(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
) -> Result<IngestManager> {
    let fetcher = Arc::new(HttpFetcher::new(settings.fetch_timeout)?);
    Ok(IngestManager::new(
        FeedNormalizer::new(fetcher),
        embedder,
        index,
        settings.ingest.clone(),
        Logger::new().with_prefix("[ingest]"),
    ))
}

async fn ingest(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    force: bool,
) -> Result<()> {
    let manager = ingest_manager(settings, embedder, index)?;
    let outcome = if force {
        IngestOutcome::Completed(interruptible(manager.run()).await?)
    } else {
        interruptible(manager.run_if_needed()).await?
    };
    render::render_outcome(&mut std::io::stdout(), &outcome)?;
    Ok(())
}

async fn search_loop(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
) -> Result<()> {
    let reason = QueryLoop::new(embedder, index, settings.query.clone(), stdin_lines(), std::io::stdout())
        .run(shutdown_signal())
        .await?;
    info!("Query loop stopped: {:?}", reason);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.clone().unwrap_or(Commands::Run);

    if command == Commands::Feeds {
        for feed in resolve_feeds(&cli)? {
            println!("{}", feed);
        }
        return Ok(());
    }

    let settings = Settings::resolve(&cli, |key| std::env::var(key).ok())?;
    let index = create_index(&settings.index).await?;
    let stats = index.describe_stats().await?;
    info!("🏦 Index '{}' holds {} records", settings.index.name, stats.total_count);

    if command == Commands::Stats {
        println!("Počet záznamov v indexe: {}", stats.total_count);
        if let Some(dimension) = stats.dimension {
            println!("Dimenzia vektorov: {}", dimension);
        }
        return Ok(());
    }

    let embedder = ns_inference::create_model(&settings.embedder).await?;
    if embedder.dimension() != settings.index.dimension {
        return Err(Error::Config(format!(
            "Embedder {} produces {} dimensions, index expects {}",
            embedder.name(),
            embedder.dimension(),
            settings.index.dimension
        )));
    }

    match command {
        Commands::Run => {
            let manager = ingest_manager(&settings, embedder.clone(), index.clone())?;
            let reason = search::ingest_then_search(
                &manager,
                embedder,
                index,
                settings.query.clone(),
                stdin_lines(),
                std::io::stdout(),
                shutdown_signal(),
            )
            .await?;
            info!("Query loop stopped: {:?}", reason);
            Ok(())
        }
        Commands::Ingest { force } => ingest(&settings, embedder, index, force).await,
        Commands::Search => search_loop(&settings, embedder, index).await,
        Commands::Query { text } => {
            let matches = search::search(
                embedder.as_ref(),
                index.as_ref(),
                &text.join(" "),
                settings.query.top_k,
            )
            .await?;
            render::render_matches(&mut std::io::stdout(), &matches)?;
            Ok(())
        }
        Commands::Stats | Commands::Feeds => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already carry everything.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::UserAbort) => {
            info!("⏹️ Interrupted, shutting down");
            ExitCode::SUCCESS
        }
        Err(e @ Error::Config(_)) => {
            error!("{}", e);
            eprintln!("Chyba: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Chyba: {}", e);
            ExitCode::FAILURE
        }
    }
}
