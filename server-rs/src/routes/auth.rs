use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::accounts::{self, Session};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<Session>)> {
    let session = accounts::sign_up(state.store.as_ref(), &state.config, body).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> AppResult<Json<Session>> {
    Ok(Json(
        accounts::sign_in(state.store.as_ref(), &state.config, body).await?,
    ))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<Session>> {
    Ok(Json(
        accounts::refresh(state.store.as_ref(), &state.config, &body.refresh_token).await?,
    ))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<Value>> {
    let message = accounts::request_password_reset(state.store.as_ref(), body).await?;
    Ok(Json(json!({ "message": message })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    accounts::change_password(state.store.as_ref(), &state.config, &user, body).await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
