use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::booking::{self, BookingOutcome};
use crate::services::fields;
use crate::AppState;

pub async fn browse(
    State(state): State<AppState>,
    Query(q): Query<FieldBrowseQuery>,
) -> AppResult<Json<Page<Field>>> {
    Ok(Json(fields::browse(state.store.as_ref(), q).await?))
}

pub async fn get_field(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<FieldWithSlots>> {
    Ok(Json(fields::field_with_slots(state.store.as_ref(), id).await?))
}

pub async fn download_details(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let text = fields::details_text(state.store.as_ref(), id).await?;
    let disposition = format!("attachment; filename=\"field_{id}_details.txt\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        text,
    ))
}

pub async fn list_slots(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<FieldSlot>>> {
    Ok(Json(fields::field_slots(state.store.as_ref(), id).await?))
}

pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<AvailabilityQuery>,
) -> AppResult<Json<Availability>> {
    Ok(Json(fields::availability(state.store.as_ref(), id, q).await?))
}

// --- admin ---

pub async fn admin_list(State(state): State<AppState>) -> AppResult<Json<Vec<Field>>> {
    Ok(Json(fields::list_all(state.store.as_ref()).await?))
}

pub async fn create_field(
    State(state): State<AppState>,
    Json(body): Json<CreateFieldRequest>,
) -> AppResult<(StatusCode, Json<Field>)> {
    let field = fields::create_field(state.store.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

pub async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateFieldRequest>,
) -> AppResult<Json<Field>> {
    Ok(Json(fields::update_field(state.store.as_ref(), id, body).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<FieldStatusRequest>,
) -> AppResult<Json<Field>> {
    Ok(Json(fields::set_status(state.store.as_ref(), id, body).await?))
}

pub async fn delete_field(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    fields::delete_field(state.store.as_ref(), id).await?;
    Ok(Json(json!({ "message": "Field deleted successfully" })))
}

/// Admin booking of an ad-hoc interval. Rejections surface as 400/403/409.
pub async fn book(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(body): Json<BookFieldRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    match booking::book_field(state.store.as_ref(), &state.config.booking, &user, id, body).await? {
        BookingOutcome::Booked(confirmation) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": confirmation.message(),
                "booking": confirmation,
            })),
        )),
        BookingOutcome::Rejected(rejection) => Err(AppError::from(rejection)),
    }
}
