//! Account and login routes.
//!
//! Email + password accounts live next to OAuth accounts in the same `users`
//! table. Every successful login path hands out the same session token, both in
//! the JSON body and as the session cookie.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use store::{NewUser, User};

use crate::auth::{
    clear_cookie, hash_password, issue_token, session_cookie, verify_password, OAuthClient,
    MIN_PASSWORD_LEN,
};
use crate::error::ApiError;
use crate::payload::{normalize_email, JsonObject};
use crate::settings::Auth;
use crate::state::AppState;

const PASSWORD_MESSAGE: &str = "Password must be at least 8 characters";

/// Email and password as sent to register, login and reset-password.
fn credentials(body: &JsonObject) -> Result<(String, String), ApiError> {
    let email = body
        .optional_str("email", "Invalid email address")?
        .unwrap_or_default();
    let email = normalize_email(&email)?;

    let password = body
        .optional_str("password", PASSWORD_MESSAGE)?
        .unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(PASSWORD_MESSAGE));
    }

    Ok((email, password))
}

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

fn signed_in(auth: &Auth, user: &User) -> Result<Response, ApiError> {
    let token =
        issue_token(&user.email, auth, Utc::now()).map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [(SET_COOKIE, session_cookie(auth, &token))],
        Json(json!({ "success": true, "user": user.to_profile(), "token": token })),
    )
        .into_response())
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    body: JsonObject,
) -> Result<Response, ApiError> {
    let (email, password) = credentials(&body)?;
    let name = body
        .optional_str("name", "name must be a string")?
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let password_hash = hash(&password)?;
    let user = state
        .store
        .create_user(NewUser::credentials(email, name, password_hash))
        .await?;

    tracing::info!("registered user {}", user.id);
    signed_in(&state.settings.auth, &user)
}

/// `POST /api/auth/login`
pub async fn login(State(state): State<AppState>, body: JsonObject) -> Result<Response, ApiError> {
    let (email, password) = credentials(&body)?;

    let user = state.store.find_user_by_email(&email).await?;
    let verified = user.filter(|user| {
        user.password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&password, hash))
    });

    let Some(user) = verified else {
        tracing::warn!("failed password login for {}", email);
        return Err(ApiError::InvalidCredentials);
    };

    signed_in(&state.settings.auth, &user)
}

/// `POST /api/auth/reset-password`
pub async fn reset_password(
    State(state): State<AppState>,
    body: JsonObject,
) -> Result<Json<Value>, ApiError> {
    let (email, password) = credentials(&body)?;
    let password_hash = hash(&password)?;

    let user = state
        .store
        .set_password_hash(&email, &password_hash)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    tracing::info!("password reset for user {}", user.id);
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/auth/logout`. Tokens are stateless, so this only drops the cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_cookie(&state.settings.auth))],
        Json(json!({ "success": true })),
    )
}

/// `GET /auth/login`: redirect to the OAuth provider.
pub async fn oauth_login(State(state): State<AppState>) -> Redirect {
    let client = match OAuthClient::new(&state.settings.oauth) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create OAuth client: {}", e);
            return Redirect::to("/login?error=config_error");
        }
    };

    match client.authorize_url(state.store.as_ref()).await {
        Ok(url) => Redirect::to(&url),
        Err(e) => {
            tracing::error!("Failed to start OAuth login: {}", e);
            Redirect::to("/login?error=oauth_error")
        }
    }
}

/// `GET /auth/callback`: finish the OAuth flow and set the session cookie.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(error) = params.get("error") {
        tracing::warn!("OAuth provider returned error: {}", error);
        return Redirect::to("/login?error=access_denied").into_response();
    }
    let Some(code) = params.get("code") else {
        tracing::warn!("OAuth callback missing code");
        return Redirect::to("/login?error=missing_code").into_response();
    };
    let Some(oauth_state) = params.get("state") else {
        tracing::warn!("OAuth callback missing state");
        return Redirect::to("/login?error=missing_state").into_response();
    };

    let client = match OAuthClient::new(&state.settings.oauth) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create OAuth client: {}", e);
            return Redirect::to("/login?error=config_error").into_response();
        }
    };

    let user = match client
        .exchange_code(state.store.as_ref(), code, oauth_state)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("OAuth exchange failed: {}", e);
            return Redirect::to("/login?error=oauth_error").into_response();
        }
    };

    let auth = &state.settings.auth;
    match issue_token(&user.email, auth, Utc::now()) {
        Ok(token) => (
            [(SET_COOKIE, session_cookie(auth, &token))],
            Redirect::to("/dashboard"),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to issue session token: {}", e);
            Redirect::to("/login?error=session_error").into_response()
        }
    }
}
