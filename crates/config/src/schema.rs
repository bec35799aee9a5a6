use std::path::PathBuf;

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

use crate::error::{ConfigError, Result};

/// Top-level configuration, one section per concern.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DocchatConfig {
    pub server: ServerConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub openai: OpenAiConfig,
}

impl DocchatConfig {
    /// Reject combinations the processing pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Validation {
                field: "chunking.chunk_size",
                message: "must be greater than 0".into(),
            });
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Validation {
                field: "chunking.chunk_overlap",
                message: format!(
                    "must be smaller than chunk_size ({}), got {}",
                    self.chunking.chunk_size, self.chunking.chunk_overlap
                ),
            });
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Validation {
                field: "retrieval.top_k",
                message: "must be greater than 0".into(),
            });
        }
        if self.server.max_sessions == 0 {
            return Err(ConfigError::Validation {
                field: "server.max_sessions",
                message: "must be greater than 0".into(),
            });
        }
        if self.retrieval.cache_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "retrieval.cache_capacity",
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

/// HTTP listener and upload storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Directory uploaded files are written to. Created on startup.
    pub upload_dir: PathBuf,
    /// Maximum accepted request body for `POST /upload`.
    pub max_upload_bytes: usize,
    /// Allow cross-origin requests from any origin.
    pub cors: bool,
    /// Sessions remembered at once; the least recently used is dropped.
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5001,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 50 * 1024 * 1024,
            cors: true,
            max_sessions: 1024,
        }
    }
}

/// Passage splitting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum passage length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive passages.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages handed to the model per question.
    pub top_k: usize,
    /// Documents kept in the processing cache before the least recently
    /// used one is evicted.
    pub cache_capacity: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            cache_capacity: 32,
        }
    }
}

/// Hosted model settings shared by the embeddings and chat clients.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dims: usize,
    pub temperature: Option<f32>,
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".into(),
            chat_model: "gpt-3.5-turbo".into(),
            embedding_model: "text-embedding-3-small".into(),
            embedding_dims: 1536,
            temperature: None,
            request_timeout_secs: 120,
        }
    }
}
