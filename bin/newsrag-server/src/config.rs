//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

use newsrag_core::{
    Distance, EmbeddingConfig, GenerationConfig, PipelineConfig, VectorIndexConfig,
};

/// Runtime configuration for newsrag-server.
///
/// Every field has a default so the server starts with nothing but the
/// provider API keys set. Call `dotenvy::dotenv()` before [`Config::from_env`]
/// to pick up a local `.env` file.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    /// A bare `PORT` variable replaces the port part.
    pub bind_address: String,

    /// sqlx connection URL of the durable store.
    pub database_url: String,
    pub database_max_connections: u32,

    /// Redis URL. `None` selects the in-process cache.
    pub redis_url: Option<String>,

    /// Lifetime of a session's cached history. `None` means no expiry.
    pub session_ttl: Option<Duration>,

    /// Upper bound on every cache round-trip.
    pub cache_timeout: Duration,

    /// Serialize history writes per session token.
    pub serialize_session_writes: bool,

    pub embedding: EmbeddingConfig,
    pub vector_index: VectorIndexConfig,
    pub generation: GenerationConfig,
    pub pipeline: PipelineConfig,

    /// Comma-separated allowed origins. `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Mount `/swagger-ui` and `/api-docs/openapi.json`.
    pub enable_swagger: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary variable source.
    ///
    /// `Config::from_lookup(|_| None)` yields the documented defaults without
    /// touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = Vars(lookup);
        let upstream_timeout = Duration::from_secs(vars.parse("NEWSRAG_UPSTREAM_TIMEOUT_SECS", 30));
        let dimension = vars.parse("NEWSRAG_VECTOR_DIMENSION", 768usize);

        let mut bind_address = vars.or("NEWSRAG_BIND", "0.0.0.0:3000");
        if let Some(port) = vars.non_empty("PORT") {
            bind_address = with_port(&bind_address, &port);
        }

        let ttl_secs: u64 = vars
            .non_empty("NEWSRAG_SESSION_TTL_SECONDS")
            .or_else(|| vars.non_empty("SESSION_TTL_SECONDS"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(7 * 24 * 60 * 60);

        Self {
            bind_address,
            database_url: vars.or("NEWSRAG_DATABASE_URL", "sqlite://newsrag.db?mode=rwc"),
            database_max_connections: vars.parse("NEWSRAG_DATABASE_MAX_CONNECTIONS", 5),
            redis_url: vars
                .non_empty("NEWSRAG_REDIS_URL")
                .or_else(|| vars.non_empty("REDIS_URL")),
            session_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            cache_timeout: Duration::from_millis(vars.parse("NEWSRAG_CACHE_TIMEOUT_MS", 2000)),
            serialize_session_writes: vars.flag("NEWSRAG_SERIALIZE_SESSION_WRITES", false),
            embedding: EmbeddingConfig {
                url: vars.or("NEWSRAG_EMBED_URL", "https://api.jina.ai/v1/embeddings"),
                api_key: vars.or("JINA_API_KEY", ""),
                model: vars.or("NEWSRAG_EMBED_MODEL", "jina-embeddings-v2-base-en"),
                dimension,
                max_chars: vars.parse("NEWSRAG_EMBED_MAX_CHARS", 8000),
                timeout: upstream_timeout,
            },
            vector_index: VectorIndexConfig {
                url: vars.or("QDRANT_URL", "http://localhost:6333"),
                api_key: vars.non_empty("QDRANT_API_KEY"),
                timeout: upstream_timeout,
            },
            generation: GenerationConfig {
                base_url: vars.or(
                    "NEWSRAG_GEMINI_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                api_key: vars.or("GEMINI_API_KEY", ""),
                model: vars.or("NEWSRAG_CHAT_MODEL", "gemini-1.5-flash"),
                retries: vars.parse("NEWSRAG_GENERATE_RETRIES", 0),
                retry_delay: Duration::from_millis(vars.parse("NEWSRAG_RETRY_DELAY_MS", 500)),
                timeout: upstream_timeout,
            },
            pipeline: PipelineConfig {
                collection: vars.or("NEWSRAG_COLLECTION", "news_articles"),
                dimension,
                distance: vars.parse("NEWSRAG_DISTANCE", Distance::Cosine),
                top_k: vars.parse("NEWSRAG_TOP_K", 5),
            },
            cors_allowed_origins: vars.non_empty("NEWSRAG_CORS_ORIGINS"),
            enable_swagger: vars.flag("NEWSRAG_ENABLE_SWAGGER", true),
            log_level: vars.or("NEWSRAG_LOG", "info"),
            log_json: vars.flag("NEWSRAG_LOG_JSON", false),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_owned())
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        (self.0)(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        (self.0)(key)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }
}

fn with_port(bind: &str, port: &str) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{bind}:{port}"),
    }
}
