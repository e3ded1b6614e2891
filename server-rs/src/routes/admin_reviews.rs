use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::reviews::{self, BulkAction};
use crate::AppState;

pub async fn all(State(state): State<AppState>) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(reviews::all(state.store.as_ref()).await?))
}

pub async fn visible(State(state): State<AppState>) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(reviews::by_visibility(state.store.as_ref(), false).await?))
}

pub async fn hidden(State(state): State<AppState>) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(reviews::by_visibility(state.store.as_ref(), true).await?))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Review>> {
    Ok(Json(reviews::get(state.store.as_ref(), id).await?))
}

pub async fn hide(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Value>> {
    if !reviews::set_hidden(state.store.as_ref(), id, true).await? {
        return Err(AppError::NotFound("Review not found or already hidden".into()));
    }
    Ok(Json(json!({ "message": "Review hidden successfully" })))
}

pub async fn unhide(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Value>> {
    if !reviews::set_hidden(state.store.as_ref(), id, false).await? {
        return Err(AppError::NotFound("Review not found or already visible".into()));
    }
    Ok(Json(json!({ "message": "Review unhidden successfully" })))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Value>> {
    if !reviews::delete(state.store.as_ref(), id).await? {
        return Err(AppError::NotFound("Review not found".into()));
    }
    Ok(Json(json!({ "message": "Review deleted successfully" })))
}

pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<KeywordQuery>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(
        reviews::search(state.store.as_ref(), q.keyword.as_deref()).await?,
    ))
}

pub async fn low_ratings(
    State(state): State<AppState>,
    Query(q): Query<LowRatingQuery>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(reviews::low_ratings(state.store.as_ref(), q.max_rating).await?))
}

pub async fn by_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(reviews::by_customer(state.store.as_ref(), customer_id).await?))
}

pub async fn statistics(State(state): State<AppState>) -> AppResult<Json<ReviewStatistics>> {
    Ok(Json(reviews::statistics(state.store.as_ref()).await?))
}

pub async fn admins(State(state): State<AppState>) -> AppResult<Json<Vec<UserPublic>>> {
    Ok(Json(reviews::admins(state.store.as_ref()).await?))
}

pub async fn bulk_hide(
    State(state): State<AppState>,
    Json(body): Json<BulkReviewRequest>,
) -> AppResult<Json<BulkResult>> {
    Ok(Json(
        reviews::bulk(state.store.as_ref(), BulkAction::Hide, &body.review_ids).await?,
    ))
}

pub async fn bulk_unhide(
    State(state): State<AppState>,
    Json(body): Json<BulkReviewRequest>,
) -> AppResult<Json<BulkResult>> {
    Ok(Json(
        reviews::bulk(state.store.as_ref(), BulkAction::Unhide, &body.review_ids).await?,
    ))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(body): Json<BulkReviewRequest>,
) -> AppResult<Json<BulkResult>> {
    Ok(Json(
        reviews::bulk(state.store.as_ref(), BulkAction::Delete, &body.review_ids).await?,
    ))
}
