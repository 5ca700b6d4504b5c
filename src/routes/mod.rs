pub mod assets;
pub mod auth;
pub mod users;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let public_dir = state.config.public_dir();

    let api = Router::new()
        .route("/health", get(health))
        .merge(users::router())
        .merge(auth::router());

    assets::fallback(api, &public_dir)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
