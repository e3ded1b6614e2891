use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::services::access::authorize_admin;
use crate::AppState;

/// Middleware: runs the global admin gate against the stored user. The role
/// from the token is replaced with the stored one.
/// Use via `axum::middleware::from_fn_with_state(state, require_admin)`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = req
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    let user = authorize_admin(state.store.as_ref(), caller.id).await?;
    req.extensions_mut().insert(AuthUser {
        id: user.id,
        role: user.role,
    });

    Ok(next.run(req).await)
}
