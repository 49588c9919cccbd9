pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod indexer;
pub mod pipeline;
pub mod vector_index;

mod http;

pub use config::{EmbeddingConfig, GenerationConfig, PipelineConfig, VectorIndexConfig};
pub use context::ContextAssembler;
pub use embedding::{Embedder, JinaEmbedder};
pub use error::{EmbeddingError, GenerationError, RagError, VectorIndexError};
pub use generation::{GeminiGenerator, Generator};
pub use indexer::{ArticleIndexer, IndexReport, IndexableArticle};
pub use pipeline::RagPipeline;
pub use vector_index::{
    ArticlePayload, Distance, IndexPoint, MemoryIndex, QdrantIndex, RetrievedPassage, VectorIndex,
};
