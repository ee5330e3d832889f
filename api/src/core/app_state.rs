use std::sync::Arc;

use ai_llm_service::{
    AiLlmError, build_client,
    config::default_config::config_from_env,
    error_handler::ConfigError,
};
use member_qa::{AnswerCache, MessageStore, QaConfig, QaEngine};
use tracing::info;

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Question pipeline over the dataset loaded at startup.
    pub engine: Arc<QaEngine>,
}

impl AppState {
    pub fn new(engine: QaEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Loads the dataset and builds the completion client from environment variables.
    ///
    /// # Errors
    /// - [`AppError::MissingEnv`] when a mandatory credential is unset
    /// - [`AppError::Config`] for any other invalid LLM setting
    /// - [`AppError::QaConfig`] for an unusable `QA_*` setting
    /// - [`AppError::Store`] when the dataset cannot be loaded
    pub async fn from_env() -> Result<Self, AppError> {
        let qa_cfg = QaConfig::from_env()?;

        let llm_cfg = config_from_env().map_err(config_error)?;
        let client = build_client(llm_cfg).map_err(config_error)?;

        let store = MessageStore::load(&qa_cfg.messages_source).await?;
        info!(model = client.model(), "completion client ready");

        let cache = AnswerCache::new(qa_cfg.cache_ttl, qa_cfg.cache_max_entries);
        let engine = QaEngine::new(Arc::new(store), Arc::new(cache), client, &qa_cfg);
        Ok(Self::new(engine))
    }
}

fn config_error(err: AiLlmError) -> AppError {
    match err {
        AiLlmError::Config(ConfigError::MissingVar(var)) => AppError::MissingEnv(var),
        other => AppError::Config(other),
    }
}
