use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::access::authorize_team_admin;
use crate::store::Store;

pub const SOLE_ADMIN_MESSAGE: &str = "Cannot leave team as you are the only admin. Please promote \
     another member to admin first or transfer team ownership.";

async fn require_player(store: &dyn Store, player_id: i32) -> AppResult<User> {
    let user = store
        .user_by_id(player_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if user.role != Role::Player {
        return Err(AppError::Forbidden("Only players can join teams".into()));
    }
    Ok(user)
}

pub async fn create_team(store: &dyn Store, player_id: i32, name: &str) -> AppResult<Team> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Team name cannot be empty".into()));
    }
    require_player(store, player_id).await?;
    if store.team_by_name(name).await?.is_some() {
        return Err(AppError::Conflict("Team name already exists".into()));
    }

    let (team, _) = store.create_team_with_admin(name, player_id).await?;
    tracing::info!(team_id = team.id, player_id, "team created");
    Ok(team)
}

pub async fn join_team(store: &dyn Store, team_id: i32, player_id: i32) -> AppResult<TeamPlayer> {
    let team = store
        .team_by_id(team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;
    if !team.is_active {
        return Err(AppError::BadRequest("Team is not active".into()));
    }
    require_player(store, player_id).await?;
    if store.active_membership(player_id, team_id).await?.is_some() {
        return Err(AppError::Conflict("Player is already a member of this team".into()));
    }

    let membership = store
        .add_membership(NewMembership {
            player_id,
            team_id,
            is_admin: false,
        })
        .await?;
    tracing::info!(team_id, player_id, "player joined team");
    Ok(membership)
}

pub async fn leave_team(store: &dyn Store, team_id: i32, player_id: i32) -> AppResult<()> {
    match store.leave_team(team_id, player_id).await? {
        LeaveOutcome::NotMember => Err(AppError::NotFound("You are not a member of this team".into())),
        LeaveOutcome::SoleAdmin => Err(AppError::BadRequest(SOLE_ADMIN_MESSAGE.into())),
        LeaveOutcome::Left { team_deactivated } => {
            tracing::info!(team_id, player_id, team_deactivated, "player left team");
            Ok(())
        }
    }
}

pub async fn list_teams(store: &dyn Store) -> AppResult<Vec<Team>> {
    Ok(store
        .list_teams()
        .await?
        .into_iter()
        .filter(|t| t.is_active)
        .collect())
}

/// Teams the player is currently an active member of.
pub async fn player_teams(store: &dyn Store, player_id: i32) -> AppResult<Vec<Team>> {
    let mut teams = Vec::new();
    for m in store.player_memberships(player_id).await? {
        if !m.is_active {
            continue;
        }
        if let Some(team) = store.team_by_id(m.team_id).await? {
            teams.push(team);
        }
    }
    Ok(teams)
}

pub async fn team_members(
    store: &dyn Store,
    team_id: i32,
    active_only: bool,
) -> AppResult<Vec<TeamMember>> {
    if store.team_by_id(team_id).await?.is_none() {
        return Err(AppError::NotFound("Team not found".into()));
    }
    let mut members = Vec::new();
    for m in store.team_memberships(team_id).await? {
        if active_only && !m.is_active {
            continue;
        }
        if let Some(user) = store.user_by_id(m.player_id).await? {
            members.push(TeamMember {
                player_id: user.id,
                player_name: user.name,
                player_email: user.email,
                player_phone: user.phone,
                is_admin: m.is_admin,
            });
        }
    }
    Ok(members)
}

pub async fn team_details(store: &dyn Store, team_id: i32) -> AppResult<TeamWithMembers> {
    let team = store
        .team_by_id(team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;
    let members = team_members(store, team_id, true).await?;
    Ok(TeamWithMembers { team, members })
}

pub async fn activate_player(
    store: &dyn Store,
    actor: &AuthUser,
    team_id: i32,
    player_id: i32,
) -> AppResult<TeamPlayer> {
    authorize_team_admin(store, actor.id, team_id).await?;
    let membership = store
        .latest_membership(player_id, team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Player is not part of this team".into()))?;
    if membership.is_active {
        return Err(AppError::BadRequest("Player is already active".into()));
    }
    store
        .set_membership_active(membership.id, true)
        .await?
        .ok_or_else(|| AppError::NotFound("Player is not part of this team".into()))
}

pub async fn deactivate_player(
    store: &dyn Store,
    actor: &AuthUser,
    team_id: i32,
    player_id: i32,
) -> AppResult<TeamPlayer> {
    authorize_team_admin(store, actor.id, team_id).await?;
    if actor.id == player_id {
        return Err(AppError::BadRequest("Admins cannot deactivate themselves".into()));
    }
    let membership = store
        .active_membership(player_id, team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Player is not an active member of this team".into()))?;
    store
        .set_membership_active(membership.id, false)
        .await?
        .ok_or_else(|| AppError::NotFound("Player is not part of this team".into()))
}

/// Whether the player's latest membership in the team is active.
pub async fn player_status(store: &dyn Store, team_id: i32, player_id: i32) -> AppResult<bool> {
    store
        .latest_membership(player_id, team_id)
        .await?
        .map(|m| m.is_active)
        .ok_or_else(|| AppError::NotFound("Player is not part of this team".into()))
}

pub async fn is_team_admin(store: &dyn Store, team_id: i32, player_id: i32) -> AppResult<bool> {
    Ok(store
        .active_membership(player_id, team_id)
        .await?
        .map(|m| m.is_admin)
        .unwrap_or(false))
}
