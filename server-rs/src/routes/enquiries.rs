use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::enquiries;
use crate::AppState;

pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SubmitEnquiryRequest>,
) -> AppResult<(StatusCode, Json<Enquiry>)> {
    let enquiry = enquiries::submit(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(enquiry)))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Enquiry>>> {
    Ok(Json(
        enquiries::by_customer(state.store.as_ref(), &user, user.id).await?,
    ))
}

pub async fn by_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(customer_id): Path<i32>,
) -> AppResult<Json<Vec<Enquiry>>> {
    Ok(Json(
        enquiries::by_customer(state.store.as_ref(), &user, customer_id).await?,
    ))
}

// --- admin ---

pub async fn visible(State(state): State<AppState>) -> AppResult<Json<Vec<Enquiry>>> {
    Ok(Json(enquiries::visible(state.store.as_ref()).await?))
}

pub async fn all(State(state): State<AppState>) -> AppResult<Json<Vec<Enquiry>>> {
    Ok(Json(enquiries::all(state.store.as_ref()).await?))
}

pub async fn by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> AppResult<Json<Vec<Enquiry>>> {
    Ok(Json(enquiries::by_status(state.store.as_ref(), &status).await?))
}

pub async fn set_visibility(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<EnquiryVisibilityRequest>,
) -> AppResult<Json<Enquiry>> {
    Ok(Json(
        enquiries::set_visibility(state.store.as_ref(), id, body).await?,
    ))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<EnquiryStatusRequest>,
) -> AppResult<Json<Enquiry>> {
    Ok(Json(enquiries::set_status(state.store.as_ref(), id, body).await?))
}

pub async fn respond(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<EnquiryResponseRequest>,
) -> AppResult<Json<Enquiry>> {
    Ok(Json(enquiries::respond(state.store.as_ref(), id, body).await?))
}
