/// User endpoints: the caller's own profile plus an admin-only listing.
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::middleware::{AdminOnly, Authenticated};
use crate::models::UserResponse;
use crate::routes::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn me(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
) -> Result<Json<UserResponse>> {
    let user = state.auth.current_user(context.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Zero-based pagination.
pub async fn list_users(
    State(state): State<AppState>,
    AdminOnly(_context): AdminOnly,
    Query(query): Query<ListUsersQuery>,
) -> Result<Response> {
    let page = query.page.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);

    let (users, total_count) = state.auth.list_users(limit, page * limit).await?;
    if users.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No users found." })),
        )
            .into_response());
    }

    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(json!({
        "totalCount": total_count,
        "page": page,
        "limit": limit,
        "users": users,
    }))
    .into_response())
}
