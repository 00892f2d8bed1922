//! Program catalog routes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/programs/search", get(search))
        .route("/programs/categories", get(categories))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// GET /api/programs/search?q=... — keywords, topic check and matched rows.
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<ruralaid_match::Analysis> {
    Json(state.pipeline.analyze(&params.q).await)
}

/// GET /api/programs/categories
async fn categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.catalog.list_categories() {
        Ok(categories) => (
            StatusCode::OK,
            Json(serde_json::json!({ "categories": categories })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
