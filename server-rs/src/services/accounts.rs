use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{generate_tokens, verify_token, AuthUser};
use crate::models::*;
use crate::store::Store;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub refresh_token: String,
    pub user: UserPublic,
}

fn session(user: &User, config: &Config) -> AppResult<Session> {
    let (token, refresh_token) = generate_tokens(user.id, user.role, &config.jwt)?;
    Ok(Session {
        token,
        refresh_token,
        user: UserPublic::from(user),
    })
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') || !email.contains('.') {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }
    Ok(email)
}

fn hash_password(password: &str, config: &Config) -> AppResult<String> {
    Ok(bcrypt::hash(password, config.auth.bcrypt_cost)?)
}

pub async fn sign_up(store: &dyn Store, config: &Config, req: SignUpRequest) -> AppResult<Session> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    let email = normalize_email(&req.email)?;
    if req.password.len() < config.auth.min_password_len {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            config.auth.min_password_len
        )));
    }
    if store.user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let user = store
        .create_user(NewUser {
            name: name.to_string(),
            email,
            phone: req.phone.trim().to_string(),
            password_hash: hash_password(&req.password, config)?,
            role: Role::Player,
        })
        .await?;
    tracing::info!(user_id = user.id, "user signed up");
    session(&user, config)
}

pub async fn sign_in(store: &dyn Store, config: &Config, req: SignInRequest) -> AppResult<Session> {
    let email = req.email.trim().to_lowercase();
    let user = store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !bcrypt::verify(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = user.id, "failed sign-in");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }
    session(&user, config)
}

/// Exchanges a refresh token for a fresh pair. The role is re-read from the
/// store.
pub async fn refresh(store: &dyn Store, config: &Config, refresh_token: &str) -> AppResult<Session> {
    let claims = verify_token(refresh_token, &config.jwt.secret)?;
    if claims.token_type != "refresh" {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    }
    let user = store
        .user_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))?;
    session(&user, config)
}

pub async fn change_password(
    store: &dyn Store,
    config: &Config,
    actor: &AuthUser,
    req: ChangePasswordRequest,
) -> AppResult<()> {
    let mut user = store
        .user_by_id(actor.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !bcrypt::verify(&req.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    if req.new_password.len() < config.auth.min_password_len {
        return Err(AppError::BadRequest(format!(
            "New password must be at least {} characters",
            config.auth.min_password_len
        )));
    }

    user.password_hash = hash_password(&req.new_password, config)?;
    store.update_user(&user).await?;
    tracing::info!(user_id = user.id, "password changed");
    Ok(())
}

/// Acknowledges a reset request for a known email. Nothing is sent.
pub async fn request_password_reset(store: &dyn Store, req: ResetPasswordRequest) -> AppResult<String> {
    let email = req.email.trim().to_lowercase();
    let user = store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Email not found".into()))?;
    tracing::info!(user_id = user.id, "password reset requested");
    Ok("Password reset request received".to_string())
}

pub async fn email_exists(store: &dyn Store, email: &str) -> AppResult<bool> {
    Ok(store.user_by_email(email.trim()).await?.is_some())
}

pub async fn user_profile(store: &dyn Store, id: i32) -> AppResult<UserPublic> {
    store
        .user_by_id(id)
        .await?
        .map(|u| UserPublic::from(&u))
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Self or admin. Only supplied fields change.
pub async fn update_profile(
    store: &dyn Store,
    config: &Config,
    actor: &AuthUser,
    user_id: i32,
    req: ProfileUpdateRequest,
) -> AppResult<UserPublic> {
    if actor.id != user_id && !actor.is_admin() {
        return Err(AppError::Forbidden("You can only update your own profile".into()));
    }
    let mut user = store
        .user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut changed = false;
    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let len = name.chars().count();
        if !(2..=100).contains(&len) {
            return Err(AppError::BadRequest("Name must be between 2 and 100 characters".into()));
        }
        user.name = name.to_string();
        changed = true;
    }
    if let Some(phone) = req.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        if !(8..=15).contains(&digits.len()) {
            return Err(AppError::BadRequest(
                "Phone number must be between 8 and 15 digits".into(),
            ));
        }
        user.phone = digits;
        changed = true;
    }
    if let Some(password) = req.password.as_deref().filter(|p| !p.is_empty()) {
        if !(6..=255).contains(&password.len()) {
            return Err(AppError::BadRequest(
                "Password must be between 6 and 255 characters".into(),
            ));
        }
        user.password_hash = hash_password(password, config)?;
        changed = true;
    }
    if !changed {
        return Err(AppError::BadRequest("No valid fields provided for update".into()));
    }

    let user = store.update_user(&user).await?;
    tracing::info!(user_id, updated_by = actor.id, "profile updated");
    Ok(UserPublic::from(&user))
}
