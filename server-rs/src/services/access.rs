use crate::error::{AppError, AppResult};
use crate::models::{TeamPlayer, User};
use crate::store::Store;

/// Global admin gate. Read-only.
pub async fn authorize_admin(store: &dyn Store, actor_id: i32) -> AppResult<User> {
    let user = store
        .user_by_id(actor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if !user.is_admin() {
        tracing::warn!(actor_id, "admin access denied");
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    Ok(user)
}

/// Team-scoped gate: the actor must hold an active admin membership.
pub async fn authorize_team_admin(
    store: &dyn Store,
    actor_id: i32,
    team_id: i32,
) -> AppResult<TeamPlayer> {
    if store.user_by_id(actor_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }
    match store.active_membership(actor_id, team_id).await? {
        Some(m) if m.is_admin => Ok(m),
        _ => {
            tracing::warn!(actor_id, team_id, "team admin access denied");
            Err(AppError::Forbidden("You are not an admin of this team".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMembership, NewUser, Role};
    use crate::store::MemoryStore;

    async fn user(store: &MemoryStore, email: &str, role: Role) -> User {
        store
            .create_user(NewUser {
                name: "Someone".into(),
                email: email.into(),
                phone: "01000000000".into(),
                password_hash: "hash".into(),
                role,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn admin_gate_outcomes() {
        let store = MemoryStore::new();
        let admin = user(&store, "admin@example.com", Role::Admin).await;
        let player = user(&store, "player@example.com", Role::Player).await;

        assert_eq!(authorize_admin(&store, admin.id).await.unwrap().id, admin.id);
        assert!(matches!(
            authorize_admin(&store, player.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_admin(&store, 9999).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn team_gate_requires_active_admin_membership() {
        let store = MemoryStore::new();
        let a = user(&store, "a@example.com", Role::Player).await;
        let b = user(&store, "b@example.com", Role::Player).await;
        let (team, admin_row) = store.create_team_with_admin("Falcons", a.id).await.unwrap();
        store
            .add_membership(NewMembership {
                player_id: b.id,
                team_id: team.id,
                is_admin: false,
            })
            .await
            .unwrap();

        assert!(authorize_team_admin(&store, a.id, team.id).await.is_ok());
        assert!(matches!(
            authorize_team_admin(&store, b.id, team.id).await,
            Err(AppError::Forbidden(_))
        ));

        store.set_membership_active(admin_row.id, false).await.unwrap();
        assert!(matches!(
            authorize_team_admin(&store, a.id, team.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_team_admin(&store, 4242, team.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
