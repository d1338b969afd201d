use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{parse_type_param, AppJson, AppQuery, AppState};
use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{ActivityEntry, LibraryEntry, LibraryFilter, LibraryStatus, MediaSnapshot},
};

#[derive(Debug, Deserialize)]
pub struct UpsertEntryRequest {
    pub media_id: Option<String>,
    pub media: Option<MediaSnapshot>,
    pub status: Option<LibraryStatus>,
    pub progress: Option<u32>,
    pub rating: Option<f64>,
    pub favorite: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub media_id: Option<String>,
    pub status: Option<LibraryStatus>,
    pub progress: Option<u32>,
    pub rating: Option<f64>,
    pub favorite: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    pub status: Option<LibraryStatus>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteEntryQuery {
    pub media_id: Option<String>,
}

pub(crate) fn validate_rating(rating: Option<f64>) -> AppResult<()> {
    match rating {
        Some(r) if !(0.0..=10.0).contains(&r) => Err(AppError::InvalidInput(
            "Rating must be between 0 and 10".to_string(),
        )),
        _ => Ok(()),
    }
}

fn required_media_id(media_id: Option<String>) -> AppResult<String> {
    media_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("media_id is required".to_string()))
}

/// Appends to the activity feed; the library write has already succeeded,
/// so a failure here is logged rather than returned
async fn record_activity(
    state: &AppState,
    user: AuthUser,
    media_id: &str,
    action: &str,
    detail: Option<String>,
) {
    if let Err(e) = state
        .store
        .insert_activity(ActivityEntry::new(user.id, media_id, action, detail))
        .await
    {
        tracing::warn!(
            user_id = %user.id,
            media_id = %media_id,
            action = %action,
            error = %e,
            "Failed to record library activity"
        );
    }
}

/// Handler for listing the caller's library
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(query): AppQuery<ListEntriesQuery>,
) -> AppResult<Json<Vec<LibraryEntry>>> {
    let filter = LibraryFilter {
        status: query.status,
        media_type: parse_type_param(query.media_type.as_deref())?,
    };
    let entries = state.store.list_entries(user.id, &filter).await?;
    Ok(Json(entries))
}

/// Handler for adding a title or replacing its entry
pub async fn upsert(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(request): AppJson<UpsertEntryRequest>,
) -> AppResult<(StatusCode, Json<LibraryEntry>)> {
    let media_id = required_media_id(request.media_id)?;
    let media = request
        .media
        .ok_or_else(|| AppError::InvalidInput("media snapshot is required".to_string()))?;
    validate_rating(request.rating)?;

    let now = Utc::now();
    let entry = LibraryEntry {
        user_id: user.id,
        media_id,
        media,
        status: request.status.unwrap_or_default(),
        progress: request.progress.unwrap_or(0),
        rating: request.rating,
        favorite: request.favorite.unwrap_or(false),
        notes: request.notes,
        created_at: now,
        updated_at: now,
    };

    let saved = state.store.upsert_entry(entry).await?;
    record_activity(
        &state,
        user,
        &saved.media_id,
        "library_upsert",
        Some(saved.status.to_string()),
    )
    .await;

    tracing::info!(
        user_id = %user.id,
        media_id = %saved.media_id,
        status = %saved.status,
        "Library entry saved"
    );

    Ok((StatusCode::CREATED, Json(saved)))
}

/// Handler for partial updates of an existing entry
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(request): AppJson<UpdateEntryRequest>,
) -> AppResult<Json<LibraryEntry>> {
    let media_id = required_media_id(request.media_id)?;
    validate_rating(request.rating)?;

    let mut entry = state
        .store
        .get_entry(user.id, &media_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("'{}' is not in your library", media_id)))?;

    let mut changes = Vec::new();
    if let Some(status) = request.status {
        entry.status = status;
        changes.push(format!("status={}", status));
    }
    if let Some(progress) = request.progress {
        entry.progress = progress;
        changes.push(format!("progress={}", progress));
    }
    if let Some(rating) = request.rating {
        entry.rating = Some(rating);
        changes.push(format!("rating={}", rating));
    }
    if let Some(favorite) = request.favorite {
        entry.favorite = favorite;
        changes.push(format!("favorite={}", favorite));
    }
    if request.notes.is_some() {
        entry.notes = request.notes;
        changes.push("notes".to_string());
    }
    entry.updated_at = Utc::now();

    let saved = state.store.upsert_entry(entry).await?;
    record_activity(
        &state,
        user,
        &media_id,
        "library_update",
        Some(changes.join(",")),
    )
    .await;

    Ok(Json(saved))
}

/// Handler for removing a title from the library
pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(query): AppQuery<DeleteEntryQuery>,
) -> AppResult<StatusCode> {
    let media_id = required_media_id(query.media_id)?;

    if !state.store.delete_entry(user.id, &media_id).await? {
        return Err(AppError::NotFound(format!(
            "'{}' is not in your library",
            media_id
        )));
    }
    record_activity(&state, user, &media_id, "library_remove", None).await;

    Ok(StatusCode::NO_CONTENT)
}
