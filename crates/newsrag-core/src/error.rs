use thiserror::Error;

/// Failures reported by an [`crate::embedding::Embedder`].
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The input was empty after trimming.
    #[error("cannot embed empty text")]
    EmptyInput,

    /// Transport-level failure (connect, timeout, TLS).
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("embedding provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered 2xx but the body had an unexpected shape.
    #[error("malformed embedding response: {0}")]
    Malformed(String),

    /// The returned vector does not match the configured dimension.
    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failures reported by a [`crate::vector_index::VectorIndex`].
#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("vector index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vector index returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed vector index response: {0}")]
    Malformed(String),

    /// The collection exists with parameters that differ from the requested ones.
    #[error(
        "collection '{collection}' exists with size {existing_size} / {existing_distance}, \
         requested {requested_size} / {requested_distance}"
    )]
    IncompatibleCollection {
        collection: String,
        existing_size: usize,
        existing_distance: String,
        requested_size: usize,
        requested_distance: String,
    },

    #[error("collection '{0}' does not exist")]
    MissingCollection(String),

    #[error("vector has dimension {actual}, collection expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failures reported by a [`crate::generation::Generator`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generative provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed generation response: {0}")]
    Malformed(String),

    /// The provider answered but produced no text (e.g. blocked by a safety filter).
    #[error("generative provider returned no text")]
    Empty,
}

impl GenerationError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            GenerationError::Malformed(_) | GenerationError::Empty => false,
        }
    }
}

/// The single error surfaced by the retrieve-and-answer pipeline.
///
/// The variant records which stage failed so the server can log it; callers
/// never receive a partial answer.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("answer generation failed: embedding step: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("answer generation failed: search step: {0}")]
    Search(#[from] VectorIndexError),

    #[error("answer generation failed: generation step: {0}")]
    Generation(#[from] GenerationError),
}

impl RagError {
    /// Name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            RagError::Embedding(_) => "embed",
            RagError::Search(_) => "search",
            RagError::Generation(_) => "generate",
        }
    }
}
