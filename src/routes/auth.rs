use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in milliseconds
    pub expires_in: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let password = body
        .ok()
        .and_then(|Json(req)| req.password)
        .and_then(password_text)
        .unwrap_or_default();

    if password.is_empty() {
        return Err(AppError::BadRequest("Password required".into()));
    }
    if password != state.config.auth.admin_password {
        tracing::warn!("Rejected login with invalid password");
        return Err(AppError::Unauthorized("Invalid password".into()));
    }

    let mut sessions = state.sessions.lock().await;
    let token = sessions.issue();
    let expires_in = u64::try_from(sessions.ttl().as_millis()).unwrap_or(u64::MAX);
    tracing::info!("Issued session token ({} active)", sessions.len());

    Ok(Json(LoginResponse { token, expires_in }))
}

/// Strings are taken as-is; numbers and booleans by their JSON text.
fn password_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
