//! Retrieve-and-answer orchestration.
//!
//! `answer(query)` runs four strictly sequential steps:
//! 1. embed the query,
//! 2. search the collection for the top-k passages,
//! 3. assemble the prompt,
//! 4. call the generative provider and return its text verbatim.
//!
//! A failure at any step aborts the whole call with a [`RagError`]. In
//! particular an embedding failure never degrades into an ungrounded
//! answer. The pipeline is read-only: recording the turn is the caller's job.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::context::ContextAssembler;
use crate::embedding::Embedder;
use crate::error::RagError;
use crate::generation::Generator;
use crate::vector_index::{RetrievedPassage, VectorIndex};

pub struct RagPipeline<E, V, G> {
    embedder: Arc<E>,
    index: Arc<V>,
    generator: Arc<G>,
    assembler: ContextAssembler,
    config: PipelineConfig,
}

impl<E, V, G> RagPipeline<E, V, G>
where
    E: Embedder,
    V: VectorIndex,
    G: Generator,
{
    pub fn new(
        embedder: Arc<E>,
        index: Arc<V>,
        generator: Arc<G>,
        assembler: ContextAssembler,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            assembler,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Steps 1 and 2: the ranked passages for `query`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>, RagError> {
        let vector = self.embedder.embed(query).await?;
        let passages = self
            .index
            .search(&self.config.collection, &vector, self.config.top_k)
            .await?;
        debug!(
            collection = %self.config.collection,
            top_k = self.config.top_k,
            hits = passages.len(),
            "retrieved passages"
        );
        Ok(passages)
    }

    /// Full pipeline. Returns the model's completion unchanged.
    pub async fn answer(&self, query: &str) -> Result<String, RagError> {
        let passages = self.retrieve(query).await?;
        let prompt = self.assembler.build_prompt(query, &passages);
        let answer = self.generator.generate(&prompt).await?;
        info!(
            passages = passages.len(),
            prompt_len = prompt.len(),
            answer_len = answer.len(),
            "answer generated"
        );
        Ok(answer)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::{EmbeddingError, GenerationError};
    use crate::vector_index::{ArticlePayload, Distance, IndexPoint, MemoryIndex};

    /// Maps a fixed vocabulary onto axis-aligned unit vectors.
    pub(crate) struct KeywordEmbedder;

    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let lower = text.to_lowercase();
            if lower.contains("unembeddable") {
                return Err(EmbeddingError::Status {
                    status: 503,
                    body: "upstream down".into(),
                });
            }
            let mut v = vec![0.0; 3];
            if lower.contains("election") {
                v[0] = 1.0;
            }
            if lower.contains("football") {
                v[1] = 1.0;
            }
            if lower.contains("weather") {
                v[2] = 1.0;
            }
            if v.iter().all(|x| *x == 0.0) {
                v = vec![0.1, 0.1, 0.1];
            }
            Ok(v)
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Generator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            if self.fail {
                return Err(GenerationError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok("Here is what I found.".into())
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            collection: "news".into(),
            dimension: 3,
            distance: Distance::Cosine,
            top_k: 2,
        }
    }

    async fn seeded_index() -> Arc<MemoryIndex> {
        let index = Arc::new(MemoryIndex::new());
        index.ensure_collection("news", 3, Distance::Cosine).await.unwrap();
        for (id, vector, title) in [
            (1, vec![1.0, 0.0, 0.0], "Election results"),
            (2, vec![0.0, 1.0, 0.0], "Football final"),
            (3, vec![0.0, 0.0, 1.0], "Weather warning"),
        ] {
            index
                .upsert(
                    "news",
                    IndexPoint {
                        id,
                        vector,
                        payload: ArticlePayload {
                            title: title.into(),
                            content: format!("{title} content"),
                            url: None,
                        },
                    },
                )
                .await
                .unwrap();
        }
        index
    }

    fn pipeline(
        index: Arc<MemoryIndex>,
        generator: Arc<RecordingGenerator>,
    ) -> RagPipeline<KeywordEmbedder, MemoryIndex, RecordingGenerator> {
        RagPipeline::new(
            Arc::new(KeywordEmbedder),
            index,
            generator,
            ContextAssembler::default(),
            config(),
        )
    }

    #[tokio::test]
    async fn best_passage_leads_the_context() {
        let generator = Arc::new(RecordingGenerator::default());
        let rag = pipeline(seeded_index().await, generator.clone());

        let answer = rag.answer("Who won the election?").await.unwrap();
        assert_eq!(answer, "Here is what I found.");

        let prompts = generator.prompts.lock().unwrap();
        let prompt = &prompts[0];
        let election = prompt.find("- Election results:").expect("top passage present");
        assert!(prompt.contains("Question: Who won the election?"));
        // top_k = 2 so exactly two passages are rendered
        assert_eq!(prompt.matches("\n- ").count(), 2);
        assert!(election < prompt.find("Question:").unwrap());
    }

    #[tokio::test]
    async fn empty_index_still_calls_the_model() {
        let index = Arc::new(MemoryIndex::new());
        index.ensure_collection("news", 3, Distance::Cosine).await.unwrap();
        let generator = Arc::new(RecordingGenerator::default());
        let rag = pipeline(index, generator.clone());

        let answer = rag.answer("Anything about the weather?").await.unwrap();
        assert!(!answer.is_empty());
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context:\n\n\nQuestion:"));
    }

    #[tokio::test]
    async fn embedding_failure_aborts_before_generation() {
        let generator = Arc::new(RecordingGenerator::default());
        let rag = pipeline(seeded_index().await, generator.clone());

        let err = rag.answer("unembeddable question").await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
        assert_eq!(err.stage(), "embed");
        assert!(err.to_string().starts_with("answer generation failed"));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_failure_aborts_before_generation() {
        // collection never created
        let generator = Arc::new(RecordingGenerator::default());
        let rag = pipeline(Arc::new(MemoryIndex::new()), generator.clone());

        let err = rag.answer("election").await.unwrap_err();
        assert!(matches!(err, RagError::Search(_)));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_surfaced() {
        let generator = Arc::new(RecordingGenerator {
            fail: true,
            ..Default::default()
        });
        let rag = pipeline(seeded_index().await, generator);

        let err = rag.answer("football").await.unwrap_err();
        assert_eq!(err.stage(), "generate");
    }
}
