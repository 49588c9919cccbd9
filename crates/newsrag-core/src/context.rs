//! Prompt assembly from ranked passages.
//!
//! Passages are rendered in the order the index returned them, one
//! `- title: content` entry each, separated by blank lines. Nothing is
//! re-ranked, deduplicated or truncated here. An empty passage list gives an
//! empty context block; the prompt is still produced and still carries the
//! instruction to answer from the (empty) context.

use crate::vector_index::RetrievedPassage;

pub const DEFAULT_PREAMBLE: &str = "You are a helpful news assistant. \
Use only the following news articles as context to answer the question. \
If the context does not contain the answer, say that you do not know.";

#[derive(Debug, Clone)]
pub struct ContextAssembler {
    preamble: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_PREAMBLE)
    }
}

impl ContextAssembler {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
        }
    }

    /// The context block alone.
    pub fn render_context(&self, passages: &[RetrievedPassage]) -> String {
        passages
            .iter()
            .map(|p| format!("- {}: {}", p.payload.title, p.payload.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The full prompt sent to the generative provider.
    pub fn build_prompt(&self, query: &str, passages: &[RetrievedPassage]) -> String {
        format!(
            "{preamble}\n\nContext:\n{context}\n\nQuestion: {query}\n\nAnswer in a clear and concise way:",
            preamble = self.preamble,
            context = self.render_context(passages),
        )
    }
}
