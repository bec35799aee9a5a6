//! Answering questions about one document: processed passages → nearest
//! passages for the question → QA prompt → chat model.

use std::sync::Arc;

use {
    docchat_agents::{ChatMessage, LlmProvider, ProviderError, prompt::build_qa_prompt},
    docchat_documents::{DocumentError, Passage, ProcessingCache},
    docchat_retrieval::{EmbeddingError, EmbeddingProvider},
    tracing::{debug, info},
};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Generation(#[from] ProviderError),
}

/// An answer and the passages it was grounded on, best match first.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Passage>,
}

pub struct DocumentChat {
    cache: Arc<ProcessingCache>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl DocumentChat {
    pub fn new(
        cache: Arc<ProcessingCache>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            cache,
            embedder,
            llm,
            top_k,
        }
    }

    pub fn cache(&self) -> &ProcessingCache {
        &self.cache
    }

    /// Answer `question` from the document at `path`. The model's text is
    /// returned as is.
    pub async fn answer(&self, path: &str, question: &str) -> Result<String, ChatError> {
        Ok(self.answer_with_sources(path, question).await?.text)
    }

    pub async fn answer_with_sources(
        &self,
        path: &str,
        question: &str,
    ) -> Result<Answer, ChatError> {
        let doc = self.cache.get_or_process(path).await?;
        let index = doc.index(self.embedder.as_ref()).await?;
        let hits = index
            .search(self.embedder.as_ref(), question, self.top_k)
            .await?;

        let sources: Vec<Passage> = hits
            .iter()
            .filter_map(|hit| doc.passages().get(hit.position).cloned())
            .collect();
        debug!(
            path,
            retrieved = sources.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved passages"
        );

        let context: Vec<&str> = sources.iter().map(|p| p.text.as_str()).collect();
        let prompt = build_qa_prompt(context.as_slice(), question);
        let completion = self.llm.complete(&[ChatMessage::user(prompt)]).await?;
        info!(
            path,
            model = self.llm.model(),
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "answered question"
        );

        Ok(Answer {
            text: completion.text,
            sources,
        })
    }
}
