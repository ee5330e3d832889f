use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) that answers completion requests.
///
/// Selected at startup from `LLM_KIND`. Adding more providers is done by
/// extending this enum and the match in [`crate::completion::build_client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI chat completions API (default).
    OpenAI,
    /// Ollama runtime, usually local.
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}
