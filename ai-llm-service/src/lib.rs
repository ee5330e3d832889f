//! Completion client for the Aurora Q&A service.
//!
//! - [`config`]: provider enum, model config, env-driven defaults
//! - [`services`]: OpenAI and Ollama chat services
//! - [`completion`]: the [`CompletionClient`] trait and [`build_client`]
//! - [`error_handler`]: unified [`AiLlmError`]

pub mod completion;
pub mod config;
pub mod error_handler;
pub mod services;

pub use completion::{CompletionClient, build_client};
pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
