//! # Persistence gateway: the [`Store`] trait
//!
//! Every read and write the HTTP layer performs goes through [`Store`], so the
//! same handlers run against PostgreSQL in production (`api::db::PgStore`) and
//! against [`crate::MemoryStore`] in tests.
//!
//! Each method touches exactly one table. There are no multi-table
//! transactions: a handler resolves the owning user first and then issues a
//! single insert or update.
//!
//! ## Read path
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`find_user_by_email`](Store::find_user_by_email) | Looks a user up by normalised email. |
//! | [`moods_since`](Store::moods_since) / [`focus_sessions_since`](Store::focus_sessions_since) / [`tasks_since`](Store::tasks_since) | Range queries feeding the daily progress buckets. Rows come back oldest first. |
//!
//! ## Write path
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`create_user`](Store::create_user) | Signup. Fails with [`StoreError::Conflict`] on a taken email. |
//! | [`upsert_oauth_user`](Store::upsert_oauth_user) | First or returning OAuth login, keyed on provider + provider id. |
//! | [`update_profile`](Store::update_profile) | Partial update of name, email and image. |
//! | [`set_password_hash`](Store::set_password_hash) | Password reset. |
//! | `insert_*` | Append-only event rows. |
//! | [`save_oauth_state`](Store::save_oauth_state) / [`take_oauth_state`](Store::take_oauth_state) | CSRF state + PKCE verifier, consumed once. |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    FocusSession, Mood, NewFocusSession, NewReflection, NewUser, ProfileUpdate, Reflection, Task,
    User,
};

/// Errors surfaced by a [`Store`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Async access to the relational store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn upsert_oauth_user(&self, user: NewUser) -> StoreResult<User>;

    /// Returns `None` when no user has `user_id`.
    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> StoreResult<Option<User>>;

    /// Returns `None` when no user has `email`.
    async fn set_password_hash(&self, email: &str, password_hash: &str)
        -> StoreResult<Option<User>>;

    async fn insert_mood(&self, user_id: Uuid, mood: String) -> StoreResult<Mood>;

    async fn insert_focus_session(
        &self,
        user_id: Uuid,
        session: NewFocusSession,
    ) -> StoreResult<FocusSession>;

    async fn insert_reflection(
        &self,
        user_id: Uuid,
        reflection: NewReflection,
    ) -> StoreResult<Reflection>;

    async fn insert_task(&self, user_id: Uuid, title: String) -> StoreResult<Task>;

    /// Moods with `created_at >= since`.
    async fn moods_since(&self, user_id: Uuid, since: DateTime<Utc>) -> StoreResult<Vec<Mood>>;

    /// Focus sessions with `start_time >= since`.
    async fn focus_sessions_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<FocusSession>>;

    /// Tasks with `created_at >= since`.
    async fn tasks_since(&self, user_id: Uuid, since: DateTime<Utc>) -> StoreResult<Vec<Task>>;

    async fn save_oauth_state(
        &self,
        state: &str,
        pkce_verifier: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Delete the state and return its verifier if it existed and had not expired at `now`.
    async fn take_oauth_state(&self, state: &str, now: DateTime<Utc>)
        -> StoreResult<Option<String>>;
}
