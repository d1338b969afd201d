use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    db::LibraryStore,
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware, AuthVerifier},
    models::MediaType,
    services::providers::Catalog,
};

pub mod activity;
pub mod carousels;
mod extract;
pub mod imports;
pub mod library;
pub mod media;
pub mod recommendations;
pub mod reviews;
pub mod search;
pub mod wrapped;

pub use extract::{AppJson, AppQuery};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn LibraryStore>,
    pub auth: Arc<dyn AuthVerifier>,
    pub catalog: Catalog,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// Routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/home-carousels", get(carousels::home))
        .route("/search-all", get(search::search_all))
        .route("/media/:slug", get(media::get_media))
        .route(
            "/library",
            get(library::list)
                .post(library::upsert)
                .patch(library::update)
                .delete(library::remove),
        )
        .route("/activity", get(activity::list).post(activity::create))
        .route(
            "/reviews",
            get(reviews::list).post(reviews::create).patch(reviews::update),
        )
        .route("/recommendations", get(recommendations::recommend))
        .route("/import/:platform", post(imports::preview))
        .route("/import/:platform/confirm", post(imports::confirm))
        .route("/wrapped", get(wrapped::summary))
        .route("/og", get(wrapped::share_card))
}

/// CORS for the web client; any origin when none is configured
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// Reads an optional `type` query value; absent, empty, and `all` mean no filter
pub(crate) fn parse_type_param(value: Option<&str>) -> AppResult<Option<MediaType>> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(AppError::InvalidInput),
    }
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_param() {
        assert_eq!(parse_type_param(None).unwrap(), None);
        assert_eq!(parse_type_param(Some("all")).unwrap(), None);
        assert_eq!(parse_type_param(Some("movie")).unwrap(), Some(MediaType::Film));
        assert!(matches!(
            parse_type_param(Some("podcast")),
            Err(AppError::InvalidInput(_))
        ));
    }
}
