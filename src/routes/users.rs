use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::{User, UserPage};
use crate::directory::{ListParams, ListQuery};
use crate::error::{AppError, AppResult};
use crate::extractors::AdminSession;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdateStoryRequest {
    pub story: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStoryResponse {
    pub ok: bool,
    pub id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/all", get(all_users))
        .route("/users/{id}", get(get_user).put(update_story))
}

async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> AppResult<Json<UserPage>> {
    // Repeated keys keep their first value instead of rejecting the request
    let query = query
        .map(|Query(pairs)| ListQuery::from_pairs(pairs))
        .unwrap_or_default();
    let params = ListParams::from_query(&query);
    let page = state.directory.list(&params).await?;
    Ok(Json(page))
}

async fn all_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.directory.all().await?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<User>> {
    let id = required_id(&id)?;
    state
        .directory
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(AppError::user_not_found)
}

async fn update_story(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStoryRequest>, JsonRejection>,
) -> AppResult<Json<UpdateStoryResponse>> {
    let id = required_id(&id)?;

    // Present and a string; "" is a valid story
    let story = match body {
        Ok(Json(UpdateStoryRequest {
            story: Some(Value::String(story)),
        })) => story,
        _ => return Err(AppError::BadRequest("Missing story".into())),
    };

    state.directory.update_story(id, &story).await?;
    tracing::info!("Updated story for user {}", id);

    Ok(Json(UpdateStoryResponse {
        ok: true,
        id: id.to_string(),
    }))
}

fn required_id(raw: &str) -> AppResult<&str> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(AppError::BadRequest("Missing id".into()));
    }
    Ok(id)
}
