//! Typed errors for the member-qa crate.

use std::path::PathBuf;

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// Failures while loading the message dataset. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Dataset file missing or unreadable.
    #[error("failed to read message dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Dataset is not the expected JSON shape.
    #[error("malformed message dataset: {0}")]
    Json(#[from] serde_json::Error),

    /// Remote messages API could not be read.
    #[error("failed to fetch messages: {0}")]
    Http(#[from] reqwest::Error),

    #[error("message dataset contains no messages")]
    Empty,

    #[error("message {id} has a blank member name")]
    BlankMember { id: String },
}

/// Per-request failures of the question pipeline.
#[derive(Debug, Error)]
pub enum QaError {
    /// The question was rejected before any filtering happened.
    #[error("{0}")]
    Validation(String),

    /// The completion call failed (after the optional single retry).
    #[error("completion failed: {0}")]
    Upstream(#[from] AiLlmError),
}

/// Unusable `QA_*` / `MESSAGES_SOURCE` settings. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} in {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("QA_MAX_PROMPT_CHARS={got} is below the minimum of {min} bytes")]
    PromptBudgetTooSmall { got: usize, min: usize },
}
