//! Answer generation: chat model abstraction, the OpenAI-compatible client,
//! and the question-answering prompt.

pub mod model;
pub mod prompt;
pub mod providers;

pub use {
    model::{ChatMessage, Completion, LlmProvider, ProviderError, Role, Usage},
    providers::openai::OpenAiChatProvider,
};
