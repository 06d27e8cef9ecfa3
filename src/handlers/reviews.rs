//! Product reviews.
//!
//! Ratings are bounded 1–5; a user may review the same product any number of
//! times.

use axum::{extract::{Path, State}, http::{HeaderMap, StatusCode}, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth;
use crate::error::{Result, StoreError};
use crate::models::Review;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReviewRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
    pub comment: String,
}

pub async fn submit_review(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let user = auth::require_user(&s, &headers).await?;
    req.validate().map_err(|e| StoreError::Validation(e.to_string()))?;
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
        .bind(product_id)
        .fetch_one(&s.db)
        .await?;
    if !exists {
        return Err(StoreError::NotFound("product"));
    }
    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, product_id, user_id, rating, comment, created_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(product_id)
    .bind(user.id)
    .bind(req.rating)
    .bind(&req.comment)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
