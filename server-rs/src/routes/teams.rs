use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::teams;
use crate::AppState;

pub async fn create_team(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateTeamRequest>,
) -> AppResult<(StatusCode, Json<Team>)> {
    let team = teams::create_team(state.store.as_ref(), user.id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn list_teams(State(state): State<AppState>) -> AppResult<Json<Vec<Team>>> {
    Ok(Json(teams::list_teams(state.store.as_ref()).await?))
}

pub async fn my_teams(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Team>>> {
    Ok(Json(teams::player_teams(state.store.as_ref(), user.id).await?))
}

pub async fn player_teams(
    State(state): State<AppState>,
    Path(player_id): Path<i32>,
) -> AppResult<Json<Vec<Team>>> {
    Ok(Json(teams::player_teams(state.store.as_ref(), player_id).await?))
}

pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<TeamWithMembers>> {
    Ok(Json(teams::team_details(state.store.as_ref(), id).await?))
}

pub async fn join_team(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<(StatusCode, Json<TeamPlayer>)> {
    let membership = teams::join_team(state.store.as_ref(), id, user.id).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn leave_team(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    teams::leave_team(state.store.as_ref(), id, user.id).await?;
    Ok(Json(json!({ "message": "Left team successfully" })))
}
