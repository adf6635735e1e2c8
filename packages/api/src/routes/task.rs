use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::Session;
use crate::error::ApiError;
use crate::payload::JsonObject;
use crate::state::AppState;

/// `POST /api/task`
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    body: JsonObject,
) -> Result<Json<Value>, ApiError> {
    let title = body.required_str("title", "Title is required")?;

    let user = session.user(state.store.as_ref()).await?;
    let task = state.store.insert_task(user.id, title.trim().to_string()).await?;

    Ok(Json(json!({ "success": true, "task": task })))
}
