use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use store::NewReflection;

use crate::auth::Session;
use crate::error::ApiError;
use crate::payload::JsonObject;
use crate::routes::focus::DURATION_MESSAGE;
use crate::state::AppState;

/// `POST /api/reflection`. `sessionDate` is stamped by the store.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    body: JsonObject,
) -> Result<Json<Value>, ApiError> {
    let new_reflection = NewReflection {
        stayed_focused: body.required_bool("stayedFocused", "stayedFocused must be a boolean")?,
        distractions: body.optional_str("distractions", "distractions must be a string")?,
        duration: body.required_seconds("duration", DURATION_MESSAGE)?,
    };

    let user = session.user(state.store.as_ref()).await?;
    let reflection = state
        .store
        .insert_reflection(user.id, new_reflection)
        .await?;

    Ok(Json(json!({ "success": true, "reflection": reflection })))
}
