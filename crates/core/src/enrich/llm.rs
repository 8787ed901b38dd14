//! Completion client used by [`LlmEnricher`](super::LlmEnricher).
//!
//! One request shape per provider: the enrichment instructions go in the
//! system slot and the record JSON is the only user turn. The answer text is
//! returned untouched; parsing it is the enricher's job.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::config::{LlmConfig, LlmProvider};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OLLAMA_API_BASE: &str = "http://localhost:11434";

/// Error type for LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// What the enricher sends for one record.
#[derive(Debug, Clone)]
pub struct EnrichmentPrompt {
    /// Instructions and the expected answer shape.
    pub system: String,
    /// The record to complete, rendered for the model.
    pub record: String,
}

/// Sends an enrichment prompt and returns the raw answer text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &EnrichmentPrompt) -> Result<String, LlmError>;
}

/// reqwest-backed client for the Anthropic messages API or a local Ollama.
pub struct HttpLlmClient {
    http: reqwest::Client,
    provider: LlmProvider,
    model: String,
    api_base: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty());
        if config.provider == LlmProvider::Anthropic && api_key.is_none() {
            return Err(LlmError::NotConfigured(
                "anthropic requires an api_key".into(),
            ));
        }

        let api_base = config.api_base.clone().unwrap_or_else(|| {
            match config.provider {
                LlmProvider::Anthropic => ANTHROPIC_API_BASE,
                LlmProvider::Ollama => OLLAMA_API_BASE,
            }
            .to_string()
        });

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;

        Ok(Self {
            http,
            provider: config.provider.clone(),
            model: config.model.clone(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            max_tokens: config.max_tokens,
        })
    }

    fn request(&self, prompt: &EnrichmentPrompt) -> reqwest::RequestBuilder {
        match self.provider {
            LlmProvider::Anthropic => self
                .http
                .post(format!("{}/v1/messages", self.api_base))
                .header("x-api-key", self.api_key.as_deref().unwrap_or_default())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": self.model,
                    "max_tokens": self.max_tokens,
                    "system": prompt.system,
                    "messages": [{ "role": "user", "content": prompt.record }],
                })),
            LlmProvider::Ollama => self
                .http
                .post(format!("{}/api/generate", self.api_base))
                .json(&json!({
                    "model": self.model,
                    "system": prompt.system,
                    "prompt": prompt.record,
                    "stream": false,
                    "format": "json",
                    "options": { "num_predict": self.max_tokens },
                })),
        }
    }

    fn answer_text(&self, body: &Value) -> Result<String, LlmError> {
        match self.provider {
            LlmProvider::Anthropic => {
                let blocks = body["content"]
                    .as_array()
                    .ok_or_else(|| LlmError::Json("missing content blocks".into()))?;
                Ok(blocks
                    .iter()
                    .filter(|block| block["type"] == "text")
                    .filter_map(|block| block["text"].as_str())
                    .collect())
            }
            LlmProvider::Ollama => body["response"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| LlmError::Json("missing response field".into())),
        }
    }
}

/// Anthropic nests the message under `error.message`, Ollama sends `error` as a string.
fn error_message(text: &str) -> String {
    let Ok(body) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };
    body["error"]
        .as_str()
        .or_else(|| body["error"]["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| text.to_string())
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &EnrichmentPrompt) -> Result<String, LlmError> {
        let response = self
            .request(prompt)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Json(e.to_string()))?;
        self.answer_text(&body)
    }
}
