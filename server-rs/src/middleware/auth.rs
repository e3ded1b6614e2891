use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::models::Role;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub role: Role,
    #[serde(rename = "type")]
    pub token_type: String, // "access" or "refresh"
    pub exp: i64,
    pub iat: i64,
}

/// Identity of the caller, taken from a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn sign(user_id: i32, role: Role, token_type: &str, ttl_secs: i64, secret: &str) -> AppResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        token_type: token_type.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Returns `(access_token, refresh_token)`.
pub fn generate_tokens(user_id: i32, role: Role, jwt: &JwtConfig) -> AppResult<(String, String)> {
    let access = sign(user_id, role, "access", jwt.access_expiry_secs, &jwt.secret)?;
    let refresh = sign(user_id, role, "refresh", jwt.refresh_expiry_secs, &jwt.secret)?;
    Ok((access, refresh))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".into()))
    }
}

fn extract_bearer(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from)
}

/// Middleware: requires a valid access token. Sets `AuthUser` in extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(&req)
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

    let claims = verify_token(&token, &state.config.jwt.secret)?;

    if claims.token_type != "access" {
        return Err(AppError::Unauthorized("Access token required".into()));
    }

    req.extensions_mut().insert(AuthUser {
        id: claims.user_id()?,
        role: claims.role,
    });

    Ok(next.run(req).await)
}
