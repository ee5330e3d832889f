//! GET /stats — dataset summary.

use axum::{Json, extract::State};
use member_qa::DatasetStats;

use crate::core::app_state::AppState;

pub async fn stats(State(state): State<AppState>) -> Json<DatasetStats> {
    Json(state.engine.store().stats())
}
