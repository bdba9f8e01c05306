//! Sobasa bot: wires the Discord gateway and a Lavalink node into the
//! playback orchestrator and serves a health endpoint.

pub mod backend;
pub mod config;
pub mod events;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use sobasa_playback::Orchestrator;
use std::sync::Arc;

/// Shared state of the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Health check handler.
///
/// Returns `200 OK` with the bot's version and its live session count.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.orchestrator.session_count(),
    }))
}

/// Builds the HTTP router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}
