//! HTTP-level tests for the directory API
//!
//! Tests cover:
//! - Paginated listing with full-text and substring search
//! - Detail and full listing queries
//! - Login and bearer-token protected story edits
//! - Search index staying in step with story edits
//! - Static entry page fallback

use std::path::Path;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use rollbook::config::Config;
use rollbook::db::{self, models::User};
use rollbook::routes;
use rollbook::state::AppState;

const PASSWORD: &str = "correct horse";

fn user(id: &str, name: &str, country: &str, city: &str, story: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        country: country.to_string(),
        city: city.to_string(),
        story: story.to_string(),
        photo: format!("/photos/{}.jpg", id),
    }
}

async fn test_state(public_dir: &Path) -> AppState {
    let pool = db::memory_pool().unwrap();
    db::run_migrations(&pool).unwrap();

    let mut config = Config::default();
    config.auth.admin_password = PASSWORD.to_string();
    config.server.public_dir = Some(public_dir.to_path_buf());

    let state = AppState::new(pool, config);
    state
        .directory
        .import(&[
            user("7", "Noor Haddad", "Jordan", "Amman", "Painter of desert light"),
            user("12", "Kenji Mori", "Japan", "Osaka", "Builds wooden boats"),
            user("42", "Ines Duarte", "Portugal", "Porto", "Teaches chemistry"),
            user("55", "Pedro Duarte", "Portugal", "Lisbon", "Paints murals"),
        ])
        .await
        .unwrap();
    state
}

async fn test_app() -> (tempfile::TempDir, Router) {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path()).await;
    (tmp, routes::app(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request(Method::POST, "/login", None, json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn result_ids(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// LIST QUERY
// ============================================================================

#[tokio::test]
async fn test_list_defaults() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(&app, get("/users")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(result_ids(&body), vec!["12", "42", "55", "7"]);
}

#[tokio::test]
async fn test_list_withholds_story() {
    let (_tmp, app) = test_app().await;
    let (_, body) = send(&app, get("/users?limit=1")).await;

    let first = &body["results"][0];
    assert!(first.get("story").is_none());
    assert_eq!(first["photo"], "/photos/12.jpg");
    assert_eq!(first["city"], "Osaka");
}

#[tokio::test]
async fn test_list_total_is_stable_across_pages() {
    let (_tmp, app) = test_app().await;
    let mut seen = Vec::new();
    for page in 1..=3 {
        let (_, body) = send(&app, get(&format!("/users?page={}&limit=2", page))).await;
        assert_eq!(body["total"], 4, "page {}", page);
        seen.extend(result_ids(&body));
    }
    assert_eq!(seen, vec!["12", "42", "55", "7"]);
}

#[tokio::test]
async fn test_list_clamps_limit_and_page() {
    let (_tmp, app) = test_app().await;
    let (_, body) = send(&app, get("/users?limit=1000&page=-2")).await;
    assert_eq!(body["limit"], 100);
    assert_eq!(body["page"], 1);

    let (_, body) = send(&app, get("/users?limit=0")).await;
    assert_eq!(body["limit"], 1);
    assert_eq!(result_ids(&body).len(), 1);
}

#[tokio::test]
async fn test_list_search_is_prefix_and() {
    let (_tmp, app) = test_app().await;

    let (_, body) = send(&app, get("/users?search=duar")).await;
    assert_eq!(body["total"], 2);

    let (_, body) = send(&app, get("/users?search=Duarte%20chem")).await;
    assert_eq!(body["total"], 1);
    assert_eq!(result_ids(&body), vec!["42"]);

    let (_, body) = send(&app, get("/users?search=paint")).await;
    assert_eq!(result_ids(&body), vec!["55", "7"]);
}

#[tokio::test]
async fn test_list_repeated_params_use_first_value() {
    let (_tmp, app) = test_app().await;

    let (status, body) = send(&app, get("/users?page=2&page=1&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["total"], 4);
    assert_eq!(result_ids(&body), vec!["55", "7"]);

    let (status, body) = send(&app, get("/users?search=kenji&search=noor")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result_ids(&body), vec!["12"]);
}

#[tokio::test]
async fn test_list_search_with_sort() {
    let (_tmp, app) = test_app().await;
    let (_, body) = send(&app, get("/users?search=duarte&sort=city&dir=desc")).await;
    assert_eq!(result_ids(&body), vec!["42", "55"]);
}

#[tokio::test]
async fn test_list_bad_sort_falls_back_to_id() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(&app, get("/users?sort=story%3B%20DROP&dir=sideways")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result_ids(&body), vec!["12", "42", "55", "7"]);
}

#[tokio::test]
async fn test_list_punctuation_search_does_not_error() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(&app, get("/users?search=%22%2A%28")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

// ============================================================================
// DETAIL + FULL LISTING
// ============================================================================

#[tokio::test]
async fn test_get_user_returns_full_record() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(&app, get("/users/42")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": "42",
            "name": "Ines Duarte",
            "country": "Portugal",
            "city": "Porto",
            "story": "Teaches chemistry",
            "photo": "/photos/42.jpg"
        })
    );
}

#[tokio::test]
async fn test_get_unknown_user_is_404() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(&app, get("/users/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "User not found" }));
}

#[tokio::test]
async fn test_get_blank_id_is_400() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(&app, get("/users/%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing id" }));
}

#[tokio::test]
async fn test_all_users_includes_stories() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(&app, get("/users/all")).await;

    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 4);
    assert_eq!(users[0]["id"], "12");
    assert_eq!(users[0]["story"], "Builds wooden boats");
}

// ============================================================================
// LOGIN
// ============================================================================

#[tokio::test]
async fn test_login_issues_token() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/login", None, json!({ "password": PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"].as_str().unwrap().len(), 64);
    assert_eq!(body["expiresIn"], 3_600_000);
}

#[tokio::test]
async fn test_login_wrong_password_is_401() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/login", None, json!({ "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid password" }));
}

#[tokio::test]
async fn test_login_missing_password_is_400() {
    let (_tmp, app) = test_app().await;
    for payload in [json!({}), json!({ "password": "" }), json!({ "password": null })] {
        let (status, body) =
            send(&app, json_request(Method::POST, "/login", None, payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Password required" }));
    }
}

#[tokio::test]
async fn test_login_malformed_body_is_400() {
    let (_tmp, app) = test_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ password"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// STORY UPDATE
// ============================================================================

#[tokio::test]
async fn test_update_story_end_to_end() {
    let (_tmp, app) = test_app().await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/users/42",
            Some(&token),
            json!({ "story": "new bio" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "id": "42" }));

    let (_, body) = send(&app, get("/users/42")).await;
    assert_eq!(body["story"], "new bio");

    let (_, body) = send(&app, get("/users?search=new")).await;
    assert!(result_ids(&body).contains(&"42".to_string()));

    // Old biography terms no longer match
    let (_, body) = send(&app, get("/users?search=chemistry")).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_update_without_token_is_401() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(
        &app,
        json_request(Method::PUT, "/users/42", None, json!({ "story": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (_, body) = send(&app, get("/users/42")).await;
    assert_eq!(body["story"], "Teaches chemistry");
}

#[tokio::test]
async fn test_update_with_forged_token_is_401() {
    let (_tmp, app) = test_app().await;
    let (status, _) = send(
        &app,
        json_request(Method::PUT, "/users/42", Some("deadbeef"), json!({ "story": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_is_checked_before_body() {
    let (_tmp, app) = test_app().await;
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/users/999")
        .body(Body::from("garbage"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_missing_story_is_400() {
    let (_tmp, app) = test_app().await;
    let token = login(&app).await;

    for payload in [json!({}), json!({ "story": null }), json!({ "story": 5 })] {
        let (status, body) = send(
            &app,
            json_request(Method::PUT, "/users/42", Some(&token), payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing story" }));
    }
}

#[tokio::test]
async fn test_update_empty_story_is_allowed() {
    let (_tmp, app) = test_app().await;
    let token = login(&app).await;

    let (status, _) = send(
        &app,
        json_request(Method::PUT, "/users/12", Some(&token), json!({ "story": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/users/12")).await;
    assert_eq!(body["story"], "");
}

#[tokio::test]
async fn test_update_unknown_user_is_404() {
    let (_tmp, app) = test_app().await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        json_request(Method::PUT, "/users/999", Some(&token), json!({ "story": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "User not found" }));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let pool = db::memory_pool().unwrap();
    db::run_migrations(&pool).unwrap();

    let mut config = Config::default();
    config.auth.admin_password = PASSWORD.to_string();
    config.auth.token_ttl_secs = 0;
    config.server.public_dir = Some(tmp.path().to_path_buf());
    let app = routes::app(AppState::new(pool, config));

    let token = login(&app).await;
    let (status, _) = send(
        &app,
        json_request(Method::PUT, "/users/42", Some(&token), json!({ "story": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// HEALTH + FALLBACK
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (_tmp, app) = test_app().await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_unmatched_route_without_entry_page_is_404() {
    let (_tmp, app) = test_app().await;
    let response = app.clone().oneshot(get("/somewhere/else")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unmatched_non_get_is_json_404() {
    let (tmp, app) = test_app().await;

    let request = json_request(Method::POST, "/nope", None, json!({}));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));

    // Same with an entry page present
    std::fs::write(tmp.path().join("index.html"), "<h1>Directory</h1>").unwrap();
    let request = json_request(Method::DELETE, "/profiles/42", None, json!({}));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_unmatched_route_serves_entry_page() {
    let (tmp, app) = test_app().await;
    std::fs::write(tmp.path().join("index.html"), "<h1>Directory</h1>").unwrap();
    std::fs::write(tmp.path().join("app.js"), "console.log(1)").unwrap();

    let (status, body) = send(&app, get("/profiles/42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("<h1>Directory</h1>".to_string()));

    let (status, body) = send(&app, get("/app.js")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("console.log(1)".to_string()));
}
