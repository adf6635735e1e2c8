//! JSON body extraction and field checks shared by the handlers.
//!
//! Bodies are read as a loose JSON object so that each handler can report a
//! field-specific message instead of a generic deserialisation error.

use axum::extract::{FromRequest, Request};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ApiError;

const INVALID_BODY: &str = "Invalid JSON body";

/// Longest accepted duration: one year of seconds.
pub const MAX_DURATION_SECONDS: f64 = 365.0 * 24.0 * 3600.0;

/// A request body that parsed as a JSON object.
#[derive(Debug, Clone, Default)]
pub struct JsonObject(pub Map<String, Value>);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(Value::Object(map))) => Ok(JsonObject(map)),
            Ok(_) => Err(ApiError::validation(INVALID_BODY)),
            Err(rejection) => {
                tracing::warn!("rejected request body: {}", rejection);
                Err(ApiError::validation(INVALID_BODY))
            }
        }
    }
}

impl JsonObject {
    fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Value::is_null)
    }

    /// A string that is not blank. The original value is returned untrimmed.
    pub fn required_str(&self, key: &str, message: &str) -> Result<String, ApiError> {
        match self.field(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            _ => Err(ApiError::validation(message)),
        }
    }

    /// A string when present. Absent and `null` both read as `None`.
    pub fn optional_str(&self, key: &str, message: &str) -> Result<Option<String>, ApiError> {
        match self.field(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ApiError::validation(message)),
        }
    }

    pub fn required_bool(&self, key: &str, message: &str) -> Result<bool, ApiError> {
        self.field(key)
            .and_then(Value::as_bool)
            .ok_or_else(|| ApiError::validation(message))
    }

    /// A non-negative JSON number of seconds up to [`MAX_DURATION_SECONDS`],
    /// rounded to a whole second.
    pub fn required_seconds(&self, key: &str, message: &str) -> Result<i64, ApiError> {
        self.field(key)
            .and_then(Value::as_f64)
            .filter(|n| (0.0..=MAX_DURATION_SECONDS).contains(n))
            .map(|n| n.round() as i64)
            .ok_or_else(|| ApiError::validation(message))
    }

    /// An RFC 3339 timestamp string, normalised to UTC.
    pub fn required_timestamp(&self, key: &str, message: &str) -> Result<DateTime<Utc>, ApiError> {
        self.field(key)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|at| at.with_timezone(&Utc))
            .ok_or_else(|| ApiError::validation(message))
    }
}

/// Trim and lower-case an email, rejecting anything without an `@`.
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(email)
}
