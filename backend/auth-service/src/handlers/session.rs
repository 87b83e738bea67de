/// Session management endpoints for the logged-in user.
use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::Authenticated;
use crate::models::SessionSummary;
use crate::routes::AppState;

pub async fn list_sessions(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
) -> Result<Json<Vec<SessionSummary>>> {
    let sessions = state
        .auth
        .list_sessions(context.user_id, context.session_id)
        .await?;
    Ok(Json(sessions))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.auth.revoke_session(id, context.user_id).await?;
    Ok(Json(json!({ "message": "Session deleted successfully." })))
}
