use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ai_llm_service::AiLlmError;
use member_qa::{ConfigError as QaConfigError, QaError, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid LLM configuration: {0}")]
    Config(#[source] AiLlmError),

    #[error("invalid Q&A configuration: {0}")]
    QaConfig(#[from] QaConfigError),

    #[error("failed to load messages: {0}")]
    Store(#[from] StoreError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("{0}")]
    BadRequest(String),

    /// Malformed or missing JSON body; keeps the extractor's status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Completion backend failed. Details go to the log only.
    #[error("upstream completion failed")]
    Upstream(#[source] AiLlmError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,

            // startup-only
            AppError::MissingEnv(_)
            | AppError::Config(_)
            | AppError::QaConfig(_)
            | AppError::Store(_)
            | AppError::Bind(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Upstream(_) => {
                "The answering service is temporarily unavailable. Please try again later.".into()
            }
            AppError::BadRequest(_) | AppError::Rejected { .. } => self.to_string(),
            _ => "internal server error".into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Upstream(e) => tracing::error!(error = %e, "completion failed"),
            AppError::BadRequest(msg) | AppError::Rejected { message: msg, .. } => {
                tracing::debug!(%status, detail = %msg, "request rejected")
            }
            other => tracing::error!(error = %other, "unexpected error in request path"),
        }
        (status, Json(ErrorBody { detail: self.detail() })).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::Rejected {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<QaError> for AppError {
    fn from(err: QaError) -> Self {
        match err {
            QaError::Validation(msg) => AppError::BadRequest(msg),
            QaError::Upstream(e) => AppError::Upstream(e),
        }
    }
}
