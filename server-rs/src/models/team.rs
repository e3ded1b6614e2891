use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
}

/// Membership row. Several historical rows may exist for one (player, team)
/// pair; at most one of them is active.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamPlayer {
    pub id: i32,
    pub player_id: i32,
    pub team_id: i32,
    pub is_admin: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewMembership {
    pub player_id: i32,
    pub team_id: i32,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPlayersQuery {
    pub active_only: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub player_id: i32,
    pub player_name: String,
    pub player_email: String,
    pub player_phone: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct TeamWithMembers {
    pub team: Team,
    pub members: Vec<TeamMember>,
}

/// Result of a player leaving a team, decided inside the store's unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left { team_deactivated: bool },
    NotMember,
    /// The only admin tried to leave while other members remain.
    SoleAdmin,
}

impl LeaveOutcome {
    /// `active` holds the team's active memberships, `leaving` among them.
    pub fn decide(leaving: &TeamPlayer, active: &[TeamPlayer]) -> Self {
        let others: Vec<&TeamPlayer> = active.iter().filter(|m| m.id != leaving.id).collect();
        if leaving.is_admin && !others.is_empty() && !others.iter().any(|m| m.is_admin) {
            return LeaveOutcome::SoleAdmin;
        }
        LeaveOutcome::Left {
            team_deactivated: others.is_empty(),
        }
    }
}
