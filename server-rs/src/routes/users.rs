use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::accounts;
use crate::AppState;

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

pub async fn check_email(
    State(state): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> AppResult<Json<Value>> {
    let exists = accounts::email_exists(state.store.as_ref(), &q.email).await?;
    Ok(Json(json!({ "exists": exists })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<UserPublic>> {
    Ok(Json(accounts::user_profile(state.store.as_ref(), user.id).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<UserPublic>> {
    Ok(Json(accounts::user_profile(state.store.as_ref(), id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(body): Json<ProfileUpdateRequest>,
) -> AppResult<Json<UserPublic>> {
    Ok(Json(
        accounts::update_profile(state.store.as_ref(), &state.config, &user, id, body).await?,
    ))
}
