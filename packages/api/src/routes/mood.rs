use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::Session;
use crate::error::ApiError;
use crate::payload::JsonObject;
use crate::state::AppState;

/// `POST /api/mood`. The label is stored exactly as sent.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    body: JsonObject,
) -> Result<Json<Value>, ApiError> {
    let label = body.required_str("mood", "Mood is required")?;

    let user = session.user(state.store.as_ref()).await?;
    let mood = state.store.insert_mood(user.id, label).await?;

    Ok(Json(json!({ "success": true, "mood": mood })))
}
