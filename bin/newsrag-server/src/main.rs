//! newsrag-server – entry point.
//!
//! Startup order for `serve` (the default command):
//! 1. Load `.env` and parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the database and run pending migrations.
//! 4. Connect the history cache (Redis, or in-process when no URL is set).
//! 5. Build the provider clients and the retrieval pipeline.
//! 6. Build the Axum router and start the HTTP server with graceful shutdown.
//!
//! `embed-news` reuses steps 1-3 and 5, then pushes every stored article into
//! the vector index and exits.

mod cache;
mod config;
mod entities;
mod error;
mod history;
mod middleware;
mod routes;
mod schemas;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use newsrag_core::{
    ArticleIndexer, ContextAssembler, GeminiGenerator, IndexableArticle, JinaEmbedder,
    QdrantIndex, RagPipeline,
};
use tracing::{info, warn};

use crate::cache::CacheBackend;
use crate::config::Config;
use crate::entities::{AnyStore, ArticleStore};
use crate::history::HistoryStore;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Embed every stored article and upsert it into the vector index.
    #[clap(name = "embed-news")]
    EmbedNews,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    init_tracing(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "newsrag-server starting");

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = AnyStore::connect(&cfg.database_url, cfg.database_max_connections).await?;
    info!(database_url = %cfg.database_url, "database ready");

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg, store.clone()).await,
        Command::EmbedNews => embed_news(&cfg, &store).await,
    };

    store.close().await;
    result
}

fn init_tracing(cfg: &Config) {
    // Warn loudly if the configured value is not a valid filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: log level '{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn serve(cfg: Config, store: AnyStore) -> anyhow::Result<()> {
    // ── 4. History cache ───────────────────────────────────────────────────────
    let cache = CacheBackend::connect(cfg.redis_url.as_deref(), cfg.cache_timeout).await?;

    // ── 5. Providers and pipeline ──────────────────────────────────────────────
    let pipeline = RagPipeline::new(
        Arc::new(JinaEmbedder::new(cfg.embedding.clone())?),
        Arc::new(QdrantIndex::new(cfg.vector_index.clone())?),
        Arc::new(GeminiGenerator::new(cfg.generation.clone())?),
        ContextAssembler::default(),
        cfg.pipeline.clone(),
    );
    info!(
        collection = %cfg.pipeline.collection,
        top_k = cfg.pipeline.top_k,
        model = %cfg.generation.model,
        "retrieval pipeline ready"
    );

    let store = Arc::new(store);
    let history = HistoryStore::new(
        Arc::clone(&store),
        Arc::new(cache),
        cfg.session_ttl,
        cfg.serialize_session_writes,
    );
    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        store,
        history,
        pipeline,
    });

    // ── 6. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("newsrag-server stopped");
    Ok(())
}

async fn embed_news(cfg: &Config, store: &AnyStore) -> anyhow::Result<()> {
    let articles = store.list_articles().await?;
    if articles.is_empty() {
        warn!("no stored articles to embed");
        return Ok(());
    }

    let indexer = ArticleIndexer::new(
        Arc::new(JinaEmbedder::new(cfg.embedding.clone())?),
        Arc::new(QdrantIndex::new(cfg.vector_index.clone())?),
        cfg.pipeline.clone(),
    );
    let total = articles.len();
    let report = indexer
        .index_all(articles.into_iter().filter_map(|a| {
            let Ok(id) = u64::try_from(a.id) else {
                warn!(article_id = a.id, "skipping article with negative id");
                return None;
            };
            Some(IndexableArticle {
                id,
                title: a.title,
                content: a.content,
                url: a.url,
            })
        }))
        .await?;

    println!(
        "embedded {} of {} articles into '{}'",
        report.indexed, total, cfg.pipeline.collection
    );
    if !report.skipped.is_empty() {
        println!("skipped (embedding failed): {:?}", report.skipped);
    }
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
