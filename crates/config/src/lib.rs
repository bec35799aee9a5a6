//! Configuration for the docchat service: schema, file discovery, and
//! environment overrides.

pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{ConfigError, Result},
    loader::{apply_env_overrides, discover_and_load, load_from_path},
    schema::{ChunkingConfig, DocchatConfig, OpenAiConfig, RetrievalConfig, ServerConfig},
};
