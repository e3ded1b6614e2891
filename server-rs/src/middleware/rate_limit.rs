use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::AppState;

/// Fixed-window counter keyed by caller.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<Windows>>,
    max_requests: u32,
    window_secs: u64,
    started: Instant,
}

#[derive(Default)]
struct Windows {
    entries: HashMap<String, WindowEntry>,
    swept_at: u64,
}

struct WindowEntry {
    count: u32,
    reset_at: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            windows: Arc::new(Mutex::new(Windows::default())),
            max_requests,
            window_secs,
            started: Instant::now(),
        }
    }

    pub async fn check(&self, key: &str) -> bool {
        let now = self.started.elapsed().as_secs();
        let mut windows = self.windows.lock().await;

        // Expired windows are dropped at most once per window length.
        if now >= windows.swept_at + self.window_secs {
            windows.entries.retain(|_, e| now < e.reset_at);
            windows.swept_at = now;
        }

        let entry = windows.entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            reset_at: now + self.window_secs,
        });

        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window_secs;
        }

        entry.count += 1;
        entry.count <= self.max_requests
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.entries.len()
    }
}

fn client_key(req: &Request) -> String {
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return format!("user:{}", user.id);
    }
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return format!("ip:{}", addr.ip());
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| format!("ip:{}", ip.trim()))
        .unwrap_or_else(|| "ip:unknown".to_string())
}

/// Middleware: general limiter applied to every route.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = format!("global:{}", client_key(&req));
    if !state.rate_limiter.check(&key).await {
        return Err(AppError::RateLimited);
    }
    Ok(next.run(req).await)
}

/// Middleware: stricter limiter for sign-in, sign-up and password reset.
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = format!("auth:{}", client_key(&req));
    if !state.auth_rate_limiter.check(&key).await {
        tracing::warn!(%key, "auth rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn window_allows_up_to_max() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.check("ip:1.2.3.4").await);
        assert!(limiter.check("ip:1.2.3.4").await);
        assert!(!limiter.check("ip:1.2.3.4").await);
        assert!(limiter.check("ip:5.6.7.8").await);
    }

    #[tokio::test]
    async fn expired_windows_are_evicted() {
        let live = RateLimiter::new(5, 60);
        for ip in ["ip:1.1.1.1", "ip:2.2.2.2", "ip:3.3.3.3"] {
            live.check(ip).await;
        }
        assert_eq!(live.tracked_keys().await, 3);

        // A zero-length window expires immediately, so only the caller's key survives.
        let expiring = RateLimiter::new(5, 0);
        for ip in ["ip:1.1.1.1", "ip:2.2.2.2", "ip:3.3.3.3"] {
            assert!(expiring.check(ip).await);
        }
        assert_eq!(expiring.tracked_keys().await, 1);
    }
}
