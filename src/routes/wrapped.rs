use std::sync::Arc;

use axum::{
    extract::State,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use super::{AppQuery, AppState};
use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::LibraryFilter,
    services::wrapped::{render_share_card, wrapped_summary, ShareCard, WrappedSummary},
};

#[derive(Debug, Deserialize)]
pub struct WrappedQuery {
    year: Option<i32>,
}

/// Handler for the caller's year in review
pub async fn summary(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(query): AppQuery<WrappedQuery>,
) -> AppResult<Json<WrappedSummary>> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let library = state
        .store
        .list_entries(user.id, &LibraryFilter::default())
        .await?;

    Ok(Json(wrapped_summary(&library, year)))
}

/// Handler rendering a public share card as SVG
pub async fn share_card(AppQuery(card): AppQuery<ShareCard>) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "image/svg+xml"),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        render_share_card(&card),
    )
}
