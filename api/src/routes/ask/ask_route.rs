//! POST /ask — answers a question from member messages.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::ask::ask_request::{AskRequest, AskResponse},
};

/// Handler: POST /ask
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8001/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"When is Layla planning her trip to London?"}'
/// ```
pub async fn ask(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<AskResponse>> {
    let Json(body) = body?;
    let answer = state.engine.ask(&body.question).await?;
    Ok(Json(AskResponse { answer }))
}
