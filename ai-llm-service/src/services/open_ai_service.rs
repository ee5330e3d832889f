//! OpenAI chat completions: `POST {endpoint}/v1/chat/completions`, non-streaming.
//!
//! The whole prompt goes out as a single user message.

use std::time::Instant;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::ChatTransport;
use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
};

#[derive(Debug)]
pub struct OpenAiService {
    transport: ChatTransport,
    cfg: LlmModelConfig,
}

impl OpenAiService {
    /// # Errors
    /// - `InvalidProvider` unless `cfg.provider` is OpenAI
    /// - `MissingApiKey` when `cfg.api_key` is unset
    /// - `InvalidEndpoint` when the endpoint lacks an http(s) scheme
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let reject = |kind| AiLlmError::from(ProviderError::new(Provider::OpenAI, kind));

        if cfg.provider != LlmProvider::OpenAI {
            return Err(reject(ProviderErrorKind::InvalidProvider));
        }
        let key = cfg
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| reject(ProviderErrorKind::MissingApiKey))?;

        // never logged: marked sensitive and kept inside the client's default headers
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| reject(ProviderErrorKind::Decode("API key is not a valid header value".into())))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, bearer);

        let transport = ChatTransport::new(
            Provider::OpenAI,
            &cfg.endpoint,
            "/v1/chat/completions",
            cfg.timeout_secs,
            headers,
        )?;

        info!(
            model = %cfg.model,
            url = transport.url(),
            timeout_secs = transport.timeout().as_secs(),
            "openai chat client ready"
        );
        Ok(Self { transport, cfg })
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Sends `prompt` and returns the first non-blank choice, trimmed.
    ///
    /// # Errors
    /// Transport, timeout, non-2xx, decode failures, and `EmptyChoices` when
    /// every choice is blank.
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let reply: CompletionReply = self
            .transport
            .post(&CompletionBody::new(&self.cfg, prompt))
            .await?;

        let answer = reply
            .first_text()
            .ok_or_else(|| self.transport.fail(ProviderErrorKind::EmptyChoices))?;
        info!(
            latency_ms = started.elapsed().as_millis(),
            answer_len = answer.len(),
            "openai completion done"
        );
        Ok(answer)
    }
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Turn<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> CompletionBody<'a> {
    fn new(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        Self {
            model: &cfg.model,
            messages: [Turn {
                role: "user",
                content: prompt,
            }],
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionReply {
    fn first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}
