use std::sync::Arc;

use axum::{
    extract::State,
    http::header::CACHE_CONTROL,
    response::IntoResponse,
    Json,
};

use super::AppState;
use crate::services::carousels::home_carousels;

pub const CAROUSEL_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

/// Handler for the home page carousels
pub async fn home(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let carousels = home_carousels(&state.catalog).await;
    ([(CACHE_CONTROL, CAROUSEL_CACHE_CONTROL)], Json(carousels))
}
