//! Health and catalog statistics routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::error;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(get_health))
        .route("/stats", get(get_stats))
}

/// GET /api/health — liveness plus catalog size. 503 when the catalog
/// cannot be read.
async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.catalog.count_programs() {
        Ok(programs) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "programs": programs,
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "error",
                    "error": e.to_string(),
                })),
            )
        }
    }
}

/// GET /api/stats — catalog statistics.
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.catalog.get_stats().unwrap_or_else(|_| ruralaid_store::CatalogStats {
        total_programs: 0,
        total_categories: 0,
        db_path: String::new(),
        db_size_mb: 0.0,
    });

    Json(serde_json::json!({
        "programs": stats.total_programs,
        "categories": stats.total_categories,
        "dbPath": stats.db_path,
        "dbSizeMb": stats.db_size_mb,
        "sessions": state.sessions.len(),
        "vocabularyTerms": state.pipeline.vocabulary().len(),
        "resultLimit": state.config.result_limit,
    }))
}
