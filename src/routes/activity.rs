use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{AppJson, AppQuery, AppState};
use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::ActivityEntry,
};

pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;
pub const MAX_ACTIVITY_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    media_id: Option<String>,
    action: Option<String>,
    detail: Option<String>,
}

fn non_empty(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{} is required", field)))
}

/// Handler for the caller's activity feed
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(query): AppQuery<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityEntry>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);
    let entries = state.store.list_activity(user.id, limit).await?;
    Ok(Json(entries))
}

/// Handler for recording an activity event
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(request): AppJson<CreateActivityRequest>,
) -> AppResult<(StatusCode, Json<ActivityEntry>)> {
    let media_id = non_empty(request.media_id, "media_id")?;
    let action = non_empty(request.action, "action")?;

    let entry = state
        .store
        .insert_activity(ActivityEntry::new(user.id, media_id, action, request.detail))
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}
