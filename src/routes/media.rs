use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use super::{parse_type_param, AppQuery, AppState};
use crate::{error::AppResult, models::MediaItem, services::media::lookup_media};

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    #[serde(rename = "type")]
    media_type: Option<String>,
}

/// Handler for a single title by slug
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    AppQuery(params): AppQuery<MediaQuery>,
) -> AppResult<Json<MediaItem>> {
    let type_hint = parse_type_param(params.media_type.as_deref())?;
    let item = lookup_media(&state.catalog, &slug, type_hint).await?;
    Ok(Json(item))
}
