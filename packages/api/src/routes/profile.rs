use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use store::{ProfileUpdate, UserProfile};

use crate::auth::{issue_token, session_cookie, Session};
use crate::error::ApiError;
use crate::payload::{normalize_email, JsonObject};
use crate::state::AppState;

/// `GET /api/user/profile`
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UserProfile>, ApiError> {
    let user = session.user(state.store.as_ref()).await?;
    Ok(Json(user.to_profile()))
}

/// `PATCH /api/user/profile`
///
/// Only the fields present in the body change. Since the session token is
/// keyed on the email, changing it re-issues the token and cookie.
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    body: JsonObject,
) -> Result<Response, ApiError> {
    if body.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let update = ProfileUpdate {
        name: body
            .optional_str("name", "name must be a string")?
            .map(|name| name.trim().to_string()),
        email: body
            .optional_str("email", "email must be a string")?
            .map(|email| normalize_email(&email))
            .transpose()?,
        image: body.optional_str("image", "image must be a string")?,
    };
    if update.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let user = session.user(state.store.as_ref()).await?;
    let updated = state
        .store
        .update_profile(user.id, update)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    if updated.email == session.email {
        return Ok(Json(json!({ "success": true, "user": updated.to_profile() })).into_response());
    }

    tracing::info!("user {} changed email", updated.id);
    let auth = &state.settings.auth;
    let token = issue_token(&updated.email, auth, Utc::now())
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [(SET_COOKIE, session_cookie(auth, &token))],
        Json(json!({ "success": true, "user": updated.to_profile(), "token": token })),
    )
        .into_response())
}
