use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::auth::Session;
use crate::error::ApiError;
use crate::progress::{focus_minutes, mood_scores, task_counts, FocusDay, MoodDay, TaskDay, Window};
use crate::state::AppState;

fn current_window(state: &AppState) -> Window {
    Window::ending_at(Utc::now(), state.settings.progress.offset())
}

/// `GET /api/progress/focus-sessions`
pub async fn focus_sessions(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<FocusDay>>, ApiError> {
    let user = session.user(state.store.as_ref()).await?;
    let window = current_window(&state);
    let rows = state.store.focus_sessions_since(user.id, window.start()).await?;
    Ok(Json(focus_minutes(&window, &rows)))
}

/// `GET /api/progress/moods`
pub async fn moods(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<MoodDay>>, ApiError> {
    let user = session.user(state.store.as_ref()).await?;
    let window = current_window(&state);
    let rows = state.store.moods_since(user.id, window.start()).await?;
    Ok(Json(mood_scores(&window, &rows)))
}

/// `GET /api/progress/tasks`
pub async fn tasks(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<TaskDay>>, ApiError> {
    let user = session.user(state.store.as_ref()).await?;
    let window = current_window(&state);
    let rows = state.store.tasks_since(user.id, window.start()).await?;
    Ok(Json(task_counts(&window, &rows)))
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::*;
    use axum::http::StatusCode;
    use chrono::{DateTime, Duration, Utc};
    use serde_json::Value;

    /// The bucket for the day `at` falls on.
    fn bucket(days: &Value, at: DateTime<Utc>) -> &Value {
        let date = at.date_naive().to_string();
        days.as_array()
            .unwrap()
            .iter()
            .find(|day| day["date"] == date.as_str())
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_week_has_seven_zero_days() {
        let (router, store) = app();
        seed_user(&store, "ada@example.com").await;
        let token = token_for("ada@example.com");

        let before = Utc::now().date_naive().to_string();
        let (status, body) = send(&router, request("GET", "/api/progress/moods", Some(&token), None)).await;
        let after = Utc::now().date_naive().to_string();
        assert_eq!(status, StatusCode::OK);

        let days = body.as_array().unwrap();
        assert_eq!(days.len(), 7);
        assert!(days.iter().all(|day| day["score"] == 0));
        let last = days[6]["date"].as_str().unwrap();
        assert!(last == before || last == after, "{last}");
    }

    #[tokio::test]
    async fn test_mood_and_task_buckets() {
        let (router, store) = app();
        let user = seed_user(&store, "ada@example.com").await;
        let other = seed_user(&store, "grace@example.com").await;
        let token = token_for("ada@example.com");
        let now = Utc::now();

        store.push_mood(user.id, "happy", now);
        store.push_mood(user.id, "sad", now);
        store.push_mood(other.id, "happy", now);
        store.push_task(user.id, "old", now - Duration::days(10));
        store.push_task(user.id, "new", now);
        store.push_task(user.id, "newer", now);

        let (_, moods) = send(&router, request("GET", "/api/progress/moods", Some(&token), None)).await;
        assert_eq!(bucket(&moods, now)["score"], 3);

        let (_, tasks) = send(&router, request("GET", "/api/progress/tasks", Some(&token), None)).await;
        let busy_days = tasks.as_array().unwrap().iter().filter(|d| d["count"] != 0).count();
        assert_eq!(busy_days, 1);
        assert_eq!(bucket(&tasks, now)["count"], 2);
    }

    #[tokio::test]
    async fn test_focus_minutes_bucket() {
        let (router, store) = app();
        let user = seed_user(&store, "ada@example.com").await;
        let token = token_for("ada@example.com");
        let now = Utc::now();

        store.push_focus_session(user.id, now, 125);
        store.push_focus_session(user.id, now, 55);

        let (status, body) = send(
            &router,
            request("GET", "/api/progress/focus-sessions", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bucket(&body, now)["minutes"], 3);
        let total: i64 = body.as_array().unwrap().iter().map(|d| d["minutes"].as_i64().unwrap()).sum();
        assert_eq!(total, 3);
    }
}
