use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{library::validate_rating, AppJson, AppQuery, AppState};
use crate::{
    db::ReviewFilter,
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::Review,
};

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    media_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    media_id: Option<String>,
    rating: Option<f64>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    contains_spoilers: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    id: Uuid,
    rating: Option<f64>,
    body: Option<String>,
    contains_spoilers: Option<bool>,
}

fn validate_body(body: &str) -> AppResult<()> {
    if body.trim().is_empty() {
        return Err(AppError::InvalidInput("Review body cannot be empty".to_string()));
    }
    Ok(())
}

/// Handler for listing reviews of a title, or the caller's own reviews
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(query): AppQuery<ReviewQuery>,
) -> AppResult<Json<Vec<Review>>> {
    let filter = match query.media_id.filter(|id| !id.trim().is_empty()) {
        Some(media_id) => ReviewFilter {
            media_id: Some(media_id),
            user_id: None,
        },
        None => ReviewFilter {
            media_id: None,
            user_id: Some(user.id),
        },
    };

    let reviews = state.store.list_reviews(&filter).await?;
    Ok(Json(reviews))
}

/// Handler for posting a review
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(request): AppJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let media_id = request
        .media_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("media_id is required".to_string()))?;
    validate_body(&request.body)?;
    validate_rating(request.rating)?;

    let now = Utc::now();
    let review = state
        .store
        .save_review(Review {
            id: Uuid::new_v4(),
            user_id: user.id,
            media_id,
            rating: request.rating,
            body: request.body,
            contains_spoilers: request.contains_spoilers,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(review_id = %review.id, media_id = %review.media_id, "Review created");

    Ok((StatusCode::CREATED, Json(review)))
}

/// Handler for editing one of the caller's reviews
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(request): AppJson<UpdateReviewRequest>,
) -> AppResult<Json<Review>> {
    // Someone else's review is reported the same as a missing one
    let mut review = state
        .store
        .get_review(request.id)
        .await?
        .filter(|r| r.user_id == user.id)
        .ok_or_else(|| AppError::NotFound(format!("Review {} not found", request.id)))?;

    if let Some(body) = request.body {
        validate_body(&body)?;
        review.body = body;
    }
    if request.rating.is_some() {
        validate_rating(request.rating)?;
        review.rating = request.rating;
    }
    if let Some(spoilers) = request.contains_spoilers {
        review.contains_spoilers = spoilers;
    }
    review.updated_at = Utc::now();

    let saved = state.store.save_review(review).await?;
    Ok(Json(saved))
}
