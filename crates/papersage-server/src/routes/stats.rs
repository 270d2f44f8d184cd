//! Health and statistics routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(get_stats))
}

/// GET /health: liveness plus the loaded model and collection size.
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let engine = state.engine.clone();
    let stats = tokio::task::spawn_blocking(move || engine.stats().ok())
        .await
        .ok()
        .flatten();

    Json(serde_json::json!({
        "status": if stats.is_some() { "healthy" } else { "degraded" },
        "model": state.engine.embedder().model_name(),
        "collection": state.engine.collection(),
        "points": stats.map(|s| s.collection.points_count).unwrap_or(0),
    }))
}

/// GET /stats: collection, embedder, metadata cache and host resources.
async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine.clone();
    let stats = tokio::task::spawn_blocking(move || engine.stats()).await??;

    let smart_search = match state.engine.smart_strategy() {
        papersage_resolve::SmartStrategy::Escalate => "escalate".to_string(),
        papersage_resolve::SmartStrategy::Fixed(mode) => format!("fixed:{}", mode),
    };

    Ok(Json(serde_json::json!({
        "collection": stats.collection,
        "model": stats.model,
        "embedding_dim": stats.embedding_dim,
        "metadata_cache": stats.metadata,
        "smart_search": smart_search,
        "index_backend": state.config.index,
        "compute": state.compute(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    })))
}
