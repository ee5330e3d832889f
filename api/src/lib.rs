use std::env;

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
mod routes;

use axum::{
    Router,
    http::Request,
    middleware,
    routing::{get, post},
};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span};

use crate::{
    core::app_state::AppState,
    error_handler::AppError,
    middleware_layer::request_id::{REQUEST_ID, request_id},
    routes::{
        ask::ask_route::ask,
        docs_route::{docs, openapi},
        health_route::health,
        stats_route::stats,
    },
};

const DEFAULT_ADDRESS: &str = "0.0.0.0:8001";

/// Loads state from the environment and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());

    let state = AppState::from_env().await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// All routes with CORS, tracing and request ids applied.
pub fn build_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
        let request_id = req
            .headers()
            .get(&REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/", get(health))
        .route("/ask", post(ask))
        .route("/stats", get(stats))
        .route("/docs", get(docs))
        .route("/openapi.json", get(openapi))
        .with_state(state)
        .layer(trace)
        .layer(middleware::from_fn(request_id))
        .layer(CorsLayer::permissive())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
