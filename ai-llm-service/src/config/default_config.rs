//! Default completion configs loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = provider kind (`openai` default, or `ollama`)
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32, default 500)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64, default 30)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` = credential (mandatory)
//! - `OPENAI_URL`     = endpoint (default `https://api.openai.com`)
//! - `OPENAI_MODEL`   = model (default `gpt-4o-mini`)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_num, must_env, opt_env,
        validate_http_endpoint,
    },
};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builds the completion config for the provider named in `LLM_KIND`.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for unknown kinds
/// - whatever the provider-specific constructor reports
pub fn config_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider = match opt_env("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::OpenAI,
    };
    match provider {
        LlmProvider::OpenAI => config_openai_chat(),
        LlmProvider::Ollama => config_ollama_chat(),
    }
}

/// Constructs the OpenAI chat config.
///
/// # Defaults
/// - `temperature = Some(0.1)`
/// - `max_tokens = Some(500)`
/// - `timeout_secs = Some(30)`
///
/// # Errors
/// [`ConfigError::MissingVar`] when `OPENAI_API_KEY` is absent.
pub fn config_openai_chat() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let endpoint = opt_env("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
    validate_http_endpoint("OPENAI_URL", &endpoint)?;
    let model = opt_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: Some(env_opt_num("LLM_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS)),
        temperature: Some(0.1),
        top_p: None,
        timeout_secs: Some(env_opt_num("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Constructs the Ollama chat config.
///
/// # Defaults
/// - `temperature = Some(0.1)`
/// - `timeout_secs = Some(30)`
pub fn config_ollama_chat() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("OLLAMA_MODEL")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens: Some(env_opt_num("LLM_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS)),
        temperature: Some(0.1),
        top_p: None,
        timeout_secs: Some(env_opt_num("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}
