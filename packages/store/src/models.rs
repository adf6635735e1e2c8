//! # Domain models for FocusFuel
//!
//! Row types returned by a [`crate::Store`] and the input records handlers pass
//! into it. Row types serialise with camelCase field names because they are
//! echoed back to clients verbatim (`userId`, `createdAt`, `startTime`, ...).
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`User`] | A full `users` row, including the Argon2 password hash. Never serialised. |
//! | [`UserProfile`] | The client-safe projection of a user (no hash, no provider fields). |
//! | [`Mood`] | One mood submission. |
//! | [`FocusSession`] | One completed focus session; `duration` is in seconds. |
//! | [`Reflection`] | A post-session reflection; `duration` is in seconds. |
//! | [`Task`] | A task entered by the user. |
//!
//! With the `postgres` feature every row type also derives `sqlx::FromRow`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full user record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub password_hash: Option<String>,
    pub provider: String,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Project to the fields a client may see.
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl UserProfile {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub password_hash: Option<String>,
    pub provider: String,
    pub provider_id: String,
}

impl NewUser {
    /// A local email + password account. The provider id is a fresh UUID so that
    /// it stays unique after the email changes.
    pub fn credentials(email: String, name: Option<String>, password_hash: String) -> Self {
        Self {
            provider_id: Uuid::new_v4().to_string(),
            email,
            name,
            image: None,
            password_hash: Some(password_hash),
            provider: "credentials".to_string(),
        }
    }
}

/// Partial profile update. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.image.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Mood {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    /// Seconds.
    pub duration: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFocusSession {
    pub start_time: DateTime<Utc>,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_date: DateTime<Utc>,
    pub stayed_focused: bool,
    pub distractions: Option<String>,
    /// Seconds.
    pub duration: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReflection {
    pub stayed_focused: bool,
    pub distractions: Option<String>,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_hides_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: None,
            image: Some("https://example.com/a.png".to_string()),
            password_hash: Some("$argon2id$secret".to_string()),
            provider: "credentials".to_string(),
            provider_id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        };

        let profile = user.to_profile();
        assert_eq!(profile.display_name(), "ada@example.com");
        assert_eq!(profile.image.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn test_rows_serialize_camel_case() {
        let now = Utc::now();
        let session = FocusSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_time: now,
            duration: 1500,
            created_at: now,
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["duration"], 1500);
        assert!(json.get("startTime").is_some());
        assert!(json.get("userId").is_some());
        assert!(json.get("start_time").is_none());
    }
}
