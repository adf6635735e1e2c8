use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    FocusSession, Mood, NewFocusSession, NewReflection, NewUser, ProfileUpdate, Reflection, Task,
    User,
};
use crate::repo::{Store, StoreError, StoreResult};

/// In-memory Store for testing and local development.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    users: Arc<Mutex<Vec<User>>>,
    moods: Arc<Mutex<Vec<Mood>>>,
    focus_sessions: Arc<Mutex<Vec<FocusSession>>>,
    reflections: Arc<Mutex<Vec<Reflection>>>,
    tasks: Arc<Mutex<Vec<Task>>>,
    oauth_states: Arc<Mutex<HashMap<String, (String, DateTime<Utc>)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mood_count(&self) -> usize {
        self.moods.lock().unwrap().len()
    }

    pub fn focus_session_count(&self) -> usize {
        self.focus_sessions.lock().unwrap().len()
    }

    pub fn reflection_count(&self) -> usize {
        self.reflections.lock().unwrap().len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Seed a mood with an explicit timestamp.
    pub fn push_mood(&self, user_id: Uuid, mood: &str, created_at: DateTime<Utc>) {
        self.moods.lock().unwrap().push(Mood {
            id: Uuid::new_v4(),
            user_id,
            mood: mood.to_string(),
            created_at,
        });
    }

    /// Seed a focus session with an explicit start time.
    pub fn push_focus_session(&self, user_id: Uuid, start_time: DateTime<Utc>, duration: i64) {
        self.focus_sessions.lock().unwrap().push(FocusSession {
            id: Uuid::new_v4(),
            user_id,
            start_time,
            duration,
            created_at: start_time,
        });
    }

    /// Seed a task with an explicit creation time.
    pub fn push_task(&self, user_id: Uuid, title: &str, created_at: DateTime<Utc>) {
        self.tasks.lock().unwrap().push(Task {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            completed: false,
            created_at,
        });
    }
}

fn user_from(new: NewUser) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: new.email,
        name: new.name,
        image: new.image,
        password_hash: new.password_hash,
        provider: new.provider,
        provider_id: new.provider_id,
        created_at: now,
        updated_at: now,
    }
}

/// Matching rows, oldest first.
fn since<T: Clone>(
    rows: &[T],
    keep: impl Fn(&T) -> bool,
    at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().filter(|row| keep(*row)).cloned().collect();
    out.sort_by_key(|row| at(row));
    out
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} exists", user.email)));
        }
        if users
            .iter()
            .any(|u| u.provider == user.provider && u.provider_id == user.provider_id)
        {
            return Err(StoreError::Conflict(format!(
                "{} account {} exists",
                user.provider, user.provider_id
            )));
        }
        let user = user_from(user);
        users.push(user.clone());
        Ok(user)
    }

    async fn upsert_oauth_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users
            .iter_mut()
            .find(|u| u.provider == user.provider && u.provider_id == user.provider_id)
        {
            existing.email = user.email;
            existing.name = user.name;
            existing.image = user.image;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} exists", user.email)));
        }
        let user = user_from(user);
        users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &update.email {
            if users.iter().any(|u| &u.email == email && u.id != user_id) {
                return Err(StoreError::Conflict(format!("email {email} exists")));
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = Some(name);
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(image) = update.image {
            user.image = Some(image);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.email == email) else {
            return Ok(None);
        };
        user.password_hash = Some(password_hash.to_string());
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn insert_mood(&self, user_id: Uuid, mood: String) -> StoreResult<Mood> {
        let row = Mood {
            id: Uuid::new_v4(),
            user_id,
            mood,
            created_at: Utc::now(),
        };
        self.moods.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn insert_focus_session(
        &self,
        user_id: Uuid,
        session: NewFocusSession,
    ) -> StoreResult<FocusSession> {
        let row = FocusSession {
            id: Uuid::new_v4(),
            user_id,
            start_time: session.start_time,
            duration: session.duration,
            created_at: Utc::now(),
        };
        self.focus_sessions.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn insert_reflection(
        &self,
        user_id: Uuid,
        reflection: NewReflection,
    ) -> StoreResult<Reflection> {
        let now = Utc::now();
        let row = Reflection {
            id: Uuid::new_v4(),
            user_id,
            session_date: now,
            stayed_focused: reflection.stayed_focused,
            distractions: reflection.distractions,
            duration: reflection.duration,
            created_at: now,
        };
        self.reflections.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn insert_task(&self, user_id: Uuid, title: String) -> StoreResult<Task> {
        let row = Task {
            id: Uuid::new_v4(),
            user_id,
            title,
            completed: false,
            created_at: Utc::now(),
        };
        self.tasks.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn moods_since(&self, user_id: Uuid, from: DateTime<Utc>) -> StoreResult<Vec<Mood>> {
        let moods = self.moods.lock().unwrap();
        Ok(since(
            &moods,
            |m| m.user_id == user_id && m.created_at >= from,
            |m| m.created_at,
        ))
    }

    async fn focus_sessions_since(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
    ) -> StoreResult<Vec<FocusSession>> {
        let sessions = self.focus_sessions.lock().unwrap();
        Ok(since(
            &sessions,
            |s| s.user_id == user_id && s.start_time >= from,
            |s| s.start_time,
        ))
    }

    async fn tasks_since(&self, user_id: Uuid, from: DateTime<Utc>) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(since(
            &tasks,
            |t| t.user_id == user_id && t.created_at >= from,
            |t| t.created_at,
        ))
    }

    async fn save_oauth_state(
        &self,
        state: &str,
        pkce_verifier: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.oauth_states
            .lock()
            .unwrap()
            .insert(state.to_string(), (pkce_verifier.to_string(), expires_at));
        Ok(())
    }

    async fn take_oauth_state(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<String>> {
        let removed = self.oauth_states.lock().unwrap().remove(state);
        Ok(removed
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(verifier, _)| verifier))
    }
}
