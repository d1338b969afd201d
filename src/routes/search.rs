use std::sync::Arc;

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;

use super::{parse_type_param, AppQuery, AppState};
use crate::{error::AppResult, models::MediaItem, services::search};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(rename = "type")]
    media_type: Option<String>,
}

/// Handler for the aggregated search endpoint
pub async fn search_all(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<MediaItem>>> {
    let media_type = parse_type_param(params.media_type.as_deref())?;
    let results = search::search_all(&state.catalog, &params.q, media_type).await?;
    Ok(Json(results))
}
