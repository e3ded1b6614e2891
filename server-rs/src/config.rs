use std::env;

use crate::error::AppError;

/// Development fallback for `JWT_SECRET`. Refused in production.
pub const DEFAULT_JWT_SECRET: &str = "change-me-to-a-secure-random-string";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub app_env: String,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub booking: BookingConfig,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_expiry_secs: i64,
    pub refresh_expiry_secs: i64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
    pub min_password_len: usize,
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
    pub auth_max: u32,
}

#[derive(Clone, Debug)]
pub struct BookingConfig {
    pub currency: String,
    pub default_status: String,
    pub admin_booking_status: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or_parse("PORT", 8080),
            app_env: env_or("APP_ENV", "development"),
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            request_timeout_secs: env_or_parse("REQUEST_TIMEOUT_SECS", 30),
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "fields"),
                user: env_or("DB_USER", "fields_admin"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 2),
                pool_max: env_or_parse("DB_POOL_MAX", 20),
            },
            jwt: JwtConfig {
                secret: env_or("JWT_SECRET", DEFAULT_JWT_SECRET),
                access_expiry_secs: parse_duration_to_secs(&env_or("JWT_ACCESS_EXPIRY", "1h")),
                refresh_expiry_secs: parse_duration_to_secs(&env_or("JWT_REFRESH_EXPIRY", "30d")),
            },
            auth: AuthConfig {
                bcrypt_cost: env_or_parse("BCRYPT_COST", bcrypt::DEFAULT_COST),
                min_password_len: 6,
            },
            rate_limit: RateLimitConfig {
                window_secs: 60,
                max_requests: env_or_parse("RATE_LIMIT_MAX", 120),
                auth_max: env_or_parse("RATE_LIMIT_AUTH", 20),
            },
            booking: BookingConfig {
                currency: env_or("BOOKING_CURRENCY", "EGP"),
                default_status: "pending".to_string(),
                admin_booking_status: "BOOKED".to_string(),
            },
        }
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// Settings that must not fall back to defaults in production.
    pub fn validate(&self) -> Result<(), AppError> {
        let secret = self.jwt.secret.trim();
        if self.is_production() && (secret.is_empty() || secret == DEFAULT_JWT_SECRET) {
            return Err(AppError::Internal(
                "JWT_SECRET must be set to a non-default value in production".into(),
            ));
        }
        Ok(())
    }
}

fn parse_duration_to_secs(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 3600;
    }
    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: i64 = num_str.parse().unwrap_or(1);
    match unit {
        "s" => num,
        "m" => num * 60,
        "h" => num * 3600,
        "d" => num * 86400,
        _ => s.parse().unwrap_or(3600),
    }
}

#[cfg(test)]
impl Config {
    /// Deterministic configuration for tests; never reads the environment.
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            app_env: "test".to_string(),
            cors_origins: Vec::new(),
            request_timeout_secs: 5,
            db: DbConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "fields_test".to_string(),
                user: "fields_admin".to_string(),
                password: String::new(),
                pool_min: 1,
                pool_max: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                access_expiry_secs: 3600,
                refresh_expiry_secs: 86400,
            },
            auth: AuthConfig {
                bcrypt_cost: 4,
                min_password_len: 6,
            },
            rate_limit: RateLimitConfig {
                window_secs: 60,
                max_requests: 1000,
                auth_max: 1000,
            },
            booking: BookingConfig {
                currency: "EGP".to_string(),
                default_status: "pending".to_string(),
                admin_booking_status: "BOOKED".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_parse_with_units() {
        assert_eq!(parse_duration_to_secs("45s"), 45);
        assert_eq!(parse_duration_to_secs("15m"), 900);
        assert_eq!(parse_duration_to_secs("1h"), 3600);
        assert_eq!(parse_duration_to_secs("30d"), 30 * 86400);
        assert_eq!(parse_duration_to_secs(""), 3600);
    }

    #[test]
    fn production_refuses_default_jwt_secret() {
        let mut config = Config::for_tests();
        config.app_env = "production".to_string();
        config.jwt.secret = DEFAULT_JWT_SECRET.to_string();
        assert!(matches!(config.validate(), Err(AppError::Internal(_))));

        config.jwt.secret = "  ".to_string();
        assert!(config.validate().is_err());

        config.jwt.secret = "a-long-random-deployment-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn development_allows_default_jwt_secret() {
        let mut config = Config::for_tests();
        config.app_env = "development".to_string();
        config.jwt.secret = DEFAULT_JWT_SECRET.to_string();
        assert!(config.validate().is_ok());
    }
}
