use axum::{extract::State, Extension, Json};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::settings::{self, SettingsPreview};
use crate::AppState;

pub async fn current(State(state): State<AppState>) -> AppResult<Json<Settings>> {
    Ok(Json(settings::current(state.store.as_ref()).await?))
}

pub async fn basic(State(state): State<AppState>) -> AppResult<Json<BasicSettings>> {
    Ok(Json(settings::basic(state.store.as_ref()).await?))
}

pub async fn about(State(state): State<AppState>) -> AppResult<Json<AboutSettings>> {
    Ok(Json(settings::about(state.store.as_ref()).await?))
}

pub async fn terms(State(state): State<AppState>) -> AppResult<Json<TermsSettings>> {
    Ok(Json(settings::terms(state.store.as_ref()).await?))
}

pub async fn contact(State(state): State<AppState>) -> AppResult<Json<ContactSettings>> {
    Ok(Json(settings::contact(state.store.as_ref()).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateSettingsRequest>,
) -> AppResult<Json<Settings>> {
    Ok(Json(settings::update(state.store.as_ref(), user.id, body).await?))
}

pub async fn preview(
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> AppResult<Json<SettingsPreview>> {
    Ok(Json(settings::preview(state.store.as_ref(), body).await?))
}

pub async fn update_logo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LogoRequest>,
) -> AppResult<Json<Settings>> {
    Ok(Json(settings::update_logo(state.store.as_ref(), user.id, body).await?))
}
