use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use store::NewFocusSession;

use crate::auth::Session;
use crate::error::ApiError;
use crate::payload::JsonObject;
use crate::state::AppState;

pub const DURATION_MESSAGE: &str = "duration must be a non-negative number";

/// `POST /api/focus-session`
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    body: JsonObject,
) -> Result<Json<Value>, ApiError> {
    let new_session = NewFocusSession {
        start_time: body
            .required_timestamp("startTime", "startTime must be a valid ISO date string")?,
        duration: body.required_seconds("duration", DURATION_MESSAGE)?,
    };

    let user = session.user(state.store.as_ref()).await?;
    let focus_session = state
        .store
        .insert_focus_session(user.id, new_session)
        .await?;

    Ok(Json(json!({ "success": true, "session": focus_session })))
}
