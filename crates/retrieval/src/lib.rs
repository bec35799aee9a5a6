//! Embedding-backed retrieval: passage texts → vectors → nearest neighbours.

pub mod embeddings;
pub mod embeddings_openai;
pub mod index;

pub use {
    embeddings::{EmbeddingError, EmbeddingProvider},
    embeddings_openai::OpenAiEmbeddingProvider,
    index::{SearchHit, VectorIndex},
};
