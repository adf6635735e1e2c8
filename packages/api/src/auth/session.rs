//! # Session tokens
//!
//! A session is an HS256 JWT whose subject is the user's email, signed with
//! `auth.jwt_secret`. Clients present it either as `Authorization: Bearer <token>`
//! or in the session cookie set by the login, register and OAuth callback routes.
//!
//! [`Session`] is an axum extractor: it only decodes the token, so a request
//! without a valid token is rejected with 401 before its body is read. Handlers
//! then call [`Session::user`] to load the backing row (404 if it is gone).

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use store::{Store, User};

use crate::error::ApiError;
use crate::settings::Auth;
use crate::state::AppState;

/// JWT claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User email.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a session token for `email`, valid for `auth.token_ttl_hours` from `now`.
pub fn issue_token(
    email: &str,
    auth: &Auth,
    now: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(auth.token_ttl_hours)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
}

/// Decode and verify a session token. Expired or tampered tokens yield `None`.
pub fn decode_token(token: &str, auth: &Auth) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| tracing::warn!("rejected session token: {}", e))
    .ok()
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(auth: &Auth, token: &str) -> String {
    let max_age = Duration::hours(auth.token_ttl_hours).num_seconds();
    let secure = if auth.secure_cookie { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        auth.cookie_name, token, max_age, secure
    )
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_cookie(auth: &Auth) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", auth.cookie_name)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_token<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// The authenticated caller, as claimed by a verified session token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub email: String,
}

impl Session {
    /// Load the user backing this session.
    pub async fn user(&self, store: &dyn Store) -> Result<User, ApiError> {
        store
            .find_user_by_email(&self.email)
            .await?
            .ok_or(ApiError::NotFound("User not found"))
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = &state.settings.auth;
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers, &auth.cookie_name))
            .ok_or(ApiError::Unauthorized)?;

        let claims = decode_token(token, auth).ok_or(ApiError::Unauthorized)?;
        Ok(Session { email: claims.sub })
    }
}
