use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::teams;
use crate::AppState;

pub async fn activate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((team_id, player_id)): Path<(i32, i32)>,
) -> AppResult<Json<TeamPlayer>> {
    Ok(Json(
        teams::activate_player(state.store.as_ref(), &user, team_id, player_id).await?,
    ))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((team_id, player_id)): Path<(i32, i32)>,
) -> AppResult<Json<TeamPlayer>> {
    Ok(Json(
        teams::deactivate_player(state.store.as_ref(), &user, team_id, player_id).await?,
    ))
}

pub async fn status(
    State(state): State<AppState>,
    Path((team_id, player_id)): Path<(i32, i32)>,
) -> AppResult<Json<Value>> {
    let active = teams::player_status(state.store.as_ref(), team_id, player_id).await?;
    Ok(Json(json!({ "teamId": team_id, "playerId": player_id, "isActive": active })))
}

pub async fn is_admin(
    State(state): State<AppState>,
    Path((team_id, player_id)): Path<(i32, i32)>,
) -> AppResult<Json<Value>> {
    let admin = teams::is_team_admin(state.store.as_ref(), team_id, player_id).await?;
    Ok(Json(json!({ "teamId": team_id, "playerId": player_id, "isAdmin": admin })))
}

pub async fn player_teams(
    State(state): State<AppState>,
    Path(player_id): Path<i32>,
) -> AppResult<Json<Vec<Team>>> {
    Ok(Json(teams::player_teams(state.store.as_ref(), player_id).await?))
}

pub async fn team_players(
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
    Query(q): Query<TeamPlayersQuery>,
) -> AppResult<Json<Vec<TeamMember>>> {
    let active_only = q.active_only.unwrap_or(true);
    Ok(Json(
        teams::team_members(state.store.as_ref(), team_id, active_only).await?,
    ))
}
