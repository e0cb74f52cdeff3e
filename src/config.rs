use std::env;
use tracing::warn;

pub const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";

/// Runtime configuration, read from the environment once at startup and
/// injected wherever it is needed.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub movie_seed: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using the development default - NOT SECURE FOR PRODUCTION");
            DEFAULT_JWT_SECRET.to_string()
        });

        AppConfig {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "./data/myflix.db".to_string()),
            jwt_secret,
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", 24),
            movie_seed: env::var("MOVIE_SEED").ok(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}
