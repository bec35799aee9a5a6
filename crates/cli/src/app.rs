//! Wiring configuration into the answering pipeline.

use std::{sync::Arc, time::Duration};

use {
    docchat_agents::OpenAiChatProvider,
    docchat_chat::DocumentChat,
    docchat_config::DocchatConfig,
    docchat_documents::{FileLoader, ProcessingCache, RecursiveCharacterSplitter},
    docchat_retrieval::OpenAiEmbeddingProvider,
    tracing::{info, warn},
};

pub fn build_chat(config: &DocchatConfig) -> anyhow::Result<DocumentChat> {
    let openai = &config.openai;
    if openai.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; questions will fail until it is configured");
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(openai.request_timeout_secs))
        .build()?;

    let embedder = OpenAiEmbeddingProvider::new(openai.api_key.clone())
        .with_model(openai.embedding_model.clone(), openai.embedding_dims)
        .with_base_url(openai.base_url.clone())
        .with_client(client.clone());
    let llm = OpenAiChatProvider::new(openai.api_key.clone())
        .with_model(openai.chat_model.clone())
        .with_base_url(openai.base_url.clone())
        .with_temperature(openai.temperature)
        .with_client(client);

    let cache = ProcessingCache::new(
        Arc::new(FileLoader),
        Arc::new(RecursiveCharacterSplitter::from_config(&config.chunking)),
        config.retrieval.cache_capacity,
    );
    info!(
        chat_model = %openai.chat_model,
        embedding_model = %openai.embedding_model,
        chunk_size = config.chunking.chunk_size,
        top_k = config.retrieval.top_k,
        "answering pipeline ready"
    );

    Ok(DocumentChat::new(
        Arc::new(cache),
        Arc::new(embedder),
        Arc::new(llm),
        config.retrieval.top_k,
    ))
}
