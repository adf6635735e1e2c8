//! # HTTP routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/api/mood` | [`mood::create`] |
//! | POST | `/api/focus-session` | [`focus::create`] |
//! | POST | `/api/reflection` | [`reflection::create`] |
//! | POST | `/api/task` | [`task::create`] |
//! | GET, PATCH | `/api/user/profile` | [`profile::show`], [`profile::update`] |
//! | GET | `/api/progress/{focus-sessions,moods,tasks}` | [`progress`] |
//! | POST | `/api/auth/{register,login,reset-password,logout}` | [`auth`] |
//! | GET | `/auth/login`, `/auth/callback` | [`auth::oauth_login`], [`auth::oauth_callback`] |
//! | GET | `/health` | liveness check |
//!
//! Protected handlers take a [`Session`](crate::auth::Session) before the body,
//! so requests without a valid token get 401 before anything is parsed.

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod focus;
pub mod mood;
pub mod profile;
pub mod progress;
pub mod reflection;
pub mod task;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/mood", post(mood::create))
        .route("/api/focus-session", post(focus::create))
        .route("/api/reflection", post(reflection::create))
        .route("/api/task", post(task::create))
        .route(
            "/api/user/profile",
            get(profile::show).patch(profile::update),
        )
        .route("/api/progress/focus-sessions", get(progress::focus_sessions))
        .route("/api/progress/moods", get(progress::moods))
        .route("/api/progress/tasks", get(progress::tasks))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/auth/logout", post(auth::logout))
        .route("/auth/login", get(auth::oauth_login))
        .route("/auth/callback", get(auth::oauth_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app();
        let (status, body) = send(&router, request("GET", "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (router, store) = app();
        seed_user(&store, "ada@example.com").await;

        let cases = [
            ("POST", "/api/mood", Some(json!({"mood": "happy"}))),
            (
                "POST",
                "/api/focus-session",
                Some(json!({"startTime": "2026-05-20T09:00:00Z", "duration": 1500})),
            ),
            (
                "POST",
                "/api/reflection",
                Some(json!({"stayedFocused": true, "duration": 1500})),
            ),
            ("POST", "/api/task", Some(json!({"title": "Write report"}))),
            ("PATCH", "/api/user/profile", Some(json!({"name": "Ada"}))),
            ("GET", "/api/user/profile", None),
            ("GET", "/api/progress/moods", None),
            ("GET", "/api/progress/focus-sessions", None),
            ("GET", "/api/progress/tasks", None),
        ];

        for (method, uri, body) in cases {
            let (status, error) = send(&router, request(method, uri, None, body.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(error, json!({"error": "Unauthorized"}));

            let (status, _) = send(&router, request(method, uri, Some("not-a-jwt"), body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }

        assert_eq!(store.mood_count(), 0);
        assert_eq!(store.focus_session_count(), 0);
        assert_eq!(store.reflection_count(), 0);
        assert_eq!(store.task_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let (router, store) = app();
        let token = token_for("ghost@example.com");

        let (status, body) = send(
            &router,
            request("POST", "/api/mood", Some(&token), Some(json!({"mood": "happy"}))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "User not found"}));
        assert_eq!(store.mood_count(), 0);

        let (status, _) = send(&router, request("GET", "/api/progress/tasks", Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let router = failing_app();
        let token = token_for("ada@example.com");

        let cases = [
            ("POST", "/api/mood", Some(&token), Some(json!({"mood": "happy"}))),
            ("GET", "/api/progress/focus-sessions", Some(&token), None),
            ("GET", "/api/user/profile", Some(&token), None),
            (
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "ada@example.com", "password": PASSWORD})),
            ),
            (
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"email": "ada@example.com", "password": PASSWORD})),
            ),
        ];

        for (method, uri, token, body) in cases {
            let (status, error) =
                send(&router, request(method, uri, token.map(String::as_str), body)).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
            assert_eq!(error, json!({"error": "Internal server error"}));
        }
    }

    #[tokio::test]
    async fn test_session_cookie_is_accepted() {
        let (router, store) = app();
        seed_user(&store, "ada@example.com").await;

        let mut req = request("GET", "/api/user/profile", None, None);
        req.headers_mut().insert(
            axum::http::header::COOKIE,
            format!("focusfuel_session={}", token_for("ada@example.com"))
                .parse()
                .unwrap(),
        );

        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
    }
}
