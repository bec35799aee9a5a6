//! Non-streaming client for OpenAI-compatible chat completion APIs.

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use crate::model::{ChatMessage, Completion, LlmProvider, ProviderError, Usage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub struct OpenAiChatProvider {
    client: reqwest::Client,
    api_key: Option<Secret<String>>,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiChatProvider {
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Share a preconfigured client (timeouts, proxies) with other providers.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        body
    }
}

#[async_trait]
impl LlmProvider for OpenAiChatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or(ProviderError::MissingApiKey)?;
        let url = chat_completions_endpoint(&self.base_url);
        debug!(model = %self.model, messages = messages.len(), "chat completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&self.request_body(messages))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = api_error_message(&body);
            warn!(status = status.as_u16(), %message, "chat completion failed");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let resp: serde_json::Value = resp.json().await?;
        let text = parse_completion_text(&resp).ok_or(ProviderError::EmptyCompletion)?;
        let usage = parse_usage(&resp);
        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "chat completion done"
        );
        Ok(Completion { text, usage })
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

fn has_version_suffix(base_url: &str) -> bool {
    base_url
        .rsplit('/')
        .next()
        .and_then(|segment| segment.strip_prefix('v'))
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

fn chat_completions_endpoint(base_url: &str) -> String {
    let base = normalize_base_url(base_url);
    if base.ends_with("/chat/completions") {
        return base;
    }
    if has_version_suffix(&base) {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    }
}

/// First choice's message content, if any.
fn parse_completion_text(resp: &serde_json::Value) -> Option<String> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
}

fn parse_usage(resp: &serde_json::Value) -> Usage {
    let u = &resp["usage"];
    Usage {
        input_tokens: token_count(&u["prompt_tokens"]),
        output_tokens: token_count(&u["completion_tokens"]),
    }
}

/// Missing counts read as 0; counts past `u32::MAX` saturate.
fn token_count(value: &serde_json::Value) -> u32 {
    value
        .as_u64()
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw
/// text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
