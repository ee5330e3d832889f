//! Provider-agnostic completion seam.
//!
//! Callers depend on `Arc<dyn CompletionClient>` so tests can swap in a stub
//! and the runtime can pick OpenAI or Ollama from configuration.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::Result,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Sends one prompt to a language model and returns its text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Single bounded-timeout completion. Blank answers are errors.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

#[async_trait]
impl CompletionClient for OpenAiService {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }

    fn model(&self) -> &str {
        OpenAiService::model(self)
    }
}

#[async_trait]
impl CompletionClient for OllamaService {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }

    fn model(&self) -> &str {
        OllamaService::model(self)
    }
}

/// Builds the concrete client for `cfg.provider`.
///
/// # Errors
/// Whatever the provider constructor reports (missing key, bad endpoint, ...).
pub fn build_client(cfg: LlmModelConfig) -> Result<Arc<dyn CompletionClient>> {
    Ok(match cfg.provider {
        LlmProvider::OpenAI => Arc::new(OpenAiService::new(cfg)?),
        LlmProvider::Ollama => Arc::new(OllamaService::new(cfg)?),
    })
}
