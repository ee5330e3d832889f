//! Ollama chat: `POST {endpoint}/api/chat` with `stream=false`.

use std::time::Instant;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::ChatTransport;
use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
};

#[derive(Debug)]
pub struct OllamaService {
    transport: ChatTransport,
    cfg: LlmModelConfig,
}

impl OllamaService {
    /// # Errors
    /// - `InvalidProvider` unless `cfg.provider` is Ollama
    /// - `InvalidEndpoint` when the endpoint lacks an http(s) scheme
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        let transport = ChatTransport::new(
            Provider::Ollama,
            &cfg.endpoint,
            "/api/chat",
            cfg.timeout_secs,
            HeaderMap::new(),
        )?;

        info!(model = %cfg.model, url = transport.url(), "ollama chat client ready");
        Ok(Self { transport, cfg })
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Options mapping: `num_predict` from `max_tokens`, plus `temperature`
    /// and `top_p` as configured.
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let reply: ChatReply = self.transport.post(&ChatBody::new(&self.cfg, prompt)).await?;

        let answer = reply
            .message
            .map(|m| m.content.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| self.transport.fail(ProviderErrorKind::EmptyChoices))?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            answer_len = answer.len(),
            "ollama chat done"
        );
        Ok(answer)
    }
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: [Turn<'a>; 1],
    stream: bool,
    options: Options,
}

impl<'a> ChatBody<'a> {
    fn new(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        Self {
            model: &cfg.model,
            messages: [Turn {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: Options {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                num_predict: cfg.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}
