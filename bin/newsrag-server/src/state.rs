//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use newsrag_core::{GeminiGenerator, JinaEmbedder, QdrantIndex, RagPipeline};

use crate::cache::CacheBackend;
use crate::config::Config;
use crate::entities::AnyStore;
use crate::history::HistoryStore;

pub type Pipeline = RagPipeline<JinaEmbedder, QdrantIndex, GeminiGenerator>;

/// State shared across all HTTP handlers.
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Durable store (sessions, messages, articles).
    pub store: Arc<AnyStore>,
    /// Durable log + cache for conversation history.
    pub history: HistoryStore<AnyStore, CacheBackend>,
    /// Retrieve-and-answer pipeline with its provider clients.
    pub pipeline: Pipeline,
}
