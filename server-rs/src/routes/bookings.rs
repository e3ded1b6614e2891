use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::booking;
use crate::AppState;

pub async fn request_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<TeamBookingRequest>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let created =
        booking::request_team_booking(state.store.as_ref(), &state.config.booking, &user, body)
            .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn status_timeline(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BookingStatusChange>>> {
    Ok(Json(booking::status_timeline(state.store.as_ref(), id).await?))
}

pub async fn team_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<i32>,
) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(
        booking::team_history(state.store.as_ref(), &user, team_id).await?,
    ))
}

pub async fn review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(body): Json<ReviewBookingRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = booking::review_booking(state.store.as_ref(), &user, id, body).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

// --- admin ---

pub async fn history(
    State(state): State<AppState>,
    Query(q): Query<BookingHistoryQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(booking::admin_history(state.store.as_ref(), q).await?))
}

pub async fn pending(State(state): State<AppState>) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(
        booking::pending(state.store.as_ref(), &state.config.booking).await?,
    ))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<Booking>> {
    Ok(Json(
        booking::update_status(state.store.as_ref(), &user, id, body).await?,
    ))
}
