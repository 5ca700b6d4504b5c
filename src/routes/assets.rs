use std::path::Path;

use axum::routing::get_service;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::AppError;
use crate::state::AppState;

/// GET/HEAD: files under `public_dir`, and any other path gets `index.html`
/// (404 when there is no entry page). Other methods get a JSON 404.
pub fn fallback(router: Router<AppState>, public_dir: &Path) -> Router<AppState> {
    let entry = ServeFile::new(public_dir.join("index.html"));
    let files = get_service(ServeDir::new(public_dir).fallback(entry)).fallback(not_found);
    router.fallback(files)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
