use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use store::repo::StoreResult;
use store::{
    FocusSession, Mood, NewFocusSession, NewReflection, NewUser, ProfileUpdate, Reflection, Store,
    StoreError, Task, User,
};
use uuid::Uuid;

/// [`Store`] backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as(
            r#"
            INSERT INTO users (email, name, image, password_hash, provider, provider_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image)
        .bind(&user.password_hash)
        .bind(&user.provider)
        .bind(&user.provider_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn upsert_oauth_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as(
            r#"
            INSERT INTO users (email, name, image, provider, provider_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (provider, provider_id)
            DO UPDATE SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image)
        .bind(&user.provider)
        .bind(&user.provider_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> StoreResult<Option<User>> {
        sqlx::query_as(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                image = COALESCE($4, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.image)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn set_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<Option<User>> {
        sqlx::query_as(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE email = $1 RETURNING *",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn insert_mood(&self, user_id: Uuid, mood: String) -> StoreResult<Mood> {
        sqlx::query_as("INSERT INTO moods (user_id, mood) VALUES ($1, $2) RETURNING *")
            .bind(user_id)
            .bind(&mood)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn insert_focus_session(
        &self,
        user_id: Uuid,
        session: NewFocusSession,
    ) -> StoreResult<FocusSession> {
        sqlx::query_as(
            "INSERT INTO focus_sessions (user_id, start_time, duration) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(session.start_time)
        .bind(session.duration)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn insert_reflection(
        &self,
        user_id: Uuid,
        reflection: NewReflection,
    ) -> StoreResult<Reflection> {
        sqlx::query_as(
            r#"
            INSERT INTO reflections (user_id, stayed_focused, distractions, duration)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(reflection.stayed_focused)
        .bind(&reflection.distractions)
        .bind(reflection.duration)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn insert_task(&self, user_id: Uuid, title: String) -> StoreResult<Task> {
        sqlx::query_as("INSERT INTO tasks (user_id, title) VALUES ($1, $2) RETURNING *")
            .bind(user_id)
            .bind(&title)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn moods_since(&self, user_id: Uuid, since: DateTime<Utc>) -> StoreResult<Vec<Mood>> {
        sqlx::query_as(
            "SELECT * FROM moods WHERE user_id = $1 AND created_at >= $2 ORDER BY created_at",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn focus_sessions_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<FocusSession>> {
        sqlx::query_as(
            "SELECT * FROM focus_sessions WHERE user_id = $1 AND start_time >= $2 ORDER BY start_time",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn tasks_since(&self, user_id: Uuid, since: DateTime<Utc>) -> StoreResult<Vec<Task>> {
        sqlx::query_as(
            "SELECT * FROM tasks WHERE user_id = $1 AND created_at >= $2 ORDER BY created_at",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn save_oauth_state(
        &self,
        state: &str,
        pkce_verifier: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO oauth_states (state, pkce_verifier, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(state)
        .bind(pkce_verifier)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn take_oauth_state(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<String>> {
        // Expired states are consumed as well.
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            "DELETE FROM oauth_states WHERE state = $1 RETURNING pkce_verifier, expires_at",
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(verifier, _)| verifier))
    }
}
