use std::sync::Arc;

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;

use super::{parse_type_param, AppQuery, AppState};
use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::LibraryFilter,
    services::recommendations::{self, Recommendation, DEFAULT_LIMIT},
};

const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(rename = "type")]
    media_type: Option<String>,
    limit: Option<usize>,
}

/// Handler for taste-based recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(params): AppQuery<RecommendationQuery>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let media_type = parse_type_param(params.media_type.as_deref())?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let library = state
        .store
        .list_entries(user.id, &LibraryFilter::default())
        .await?;
    let results = recommendations::recommend(&state.catalog, &library, media_type, limit).await;

    Ok(Json(results))
}
