use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::*;
use crate::services::reviews;
use crate::AppState;

pub async fn visible(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<Page<Review>>> {
    Ok(Json(reviews::visible(state.store.as_ref(), q).await?))
}

pub async fn visible_by_rating(
    State(state): State<AppState>,
    Query(q): Query<RatingRangeQuery>,
) -> AppResult<Json<Page<Review>>> {
    Ok(Json(reviews::visible_by_rating(state.store.as_ref(), q).await?))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Review>> {
    Ok(Json(reviews::visible_by_id(state.store.as_ref(), id).await?))
}

pub async fn customer_reviews(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(
        reviews::customer_visible(state.store.as_ref(), customer_id).await?,
    ))
}

pub async fn average_rating(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let average = reviews::average_rating(state.store.as_ref()).await?;
    Ok(Json(json!({ "averageRating": average })))
}

pub async fn customer_average_rating(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> AppResult<Json<Value>> {
    let average = reviews::customer_average_rating(state.store.as_ref(), customer_id).await?;
    Ok(Json(json!({ "customerId": customer_id, "averageRating": average })))
}

pub async fn count(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let count = reviews::visible_count(state.store.as_ref()).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn breakdown(State(state): State<AppState>) -> AppResult<Json<RatingBreakdown>> {
    Ok(Json(reviews::breakdown(state.store.as_ref()).await?))
}

pub async fn recent(
    State(state): State<AppState>,
    Query(q): Query<RecentQuery>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(reviews::recent(state.store.as_ref(), q.limit).await?))
}
