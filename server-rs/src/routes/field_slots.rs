use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::*;
use crate::services::fields;
use crate::AppState;

pub async fn create_slot(
    State(state): State<AppState>,
    Json(body): Json<CreateSlotRequest>,
) -> AppResult<(StatusCode, Json<FieldSlot>)> {
    let slot = fields::create_slot(state.store.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

pub async fn update_slot(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateSlotRequest>,
) -> AppResult<Json<FieldSlot>> {
    Ok(Json(fields::update_slot(state.store.as_ref(), id, body).await?))
}

pub async fn delete_slot(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    fields::delete_slot(state.store.as_ref(), id).await?;
    Ok(Json(json!({ "message": "Field slot deleted successfully" })))
}
