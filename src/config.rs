//! Configuration module for environment variables and application settings

use std::env;

use anyhow::{Context, Result, anyhow};

const DEFAULT_CORS_ORIGINS: [&str; 2] = [
    "https://event-listing-frontend.vercel.app",
    "http://localhost:5173",
];

/// Longest accepted token validity window: ten years.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Application configuration, loaded once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseSettings>,
    pub server: ServerConfig,
}

#[derive(Clone)]
pub struct AuthConfig {
    /// Token signing secret
    pub jwt_secret: String,
    /// Token validity window in seconds
    pub token_ttl_secs: i64,
    /// Mark the auth cookie `Secure`
    pub cookie_secure: bool,
}

// Keeps the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow!("JWT_SECRET environment variable is required"))?;

        let token_ttl_secs: i64 = match get("JWT_TTL_SECONDS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("JWT_TTL_SECONDS must be an integer, got {raw:?}"))?,
            None => 24 * 60 * 60,
        };
        if token_ttl_secs <= 0 {
            return Err(anyhow!("JWT_TTL_SECONDS must be positive"));
        }
        if token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(anyhow!(
                "JWT_TTL_SECONDS must be at most {MAX_TOKEN_TTL_SECS}, got {token_ttl_secs}"
            ));
        }

        let cookie_secure = get("COOKIE_SECURE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let database = get("DATABASE_URL").map(|url| DatabaseSettings {
            url,
            max_connections: get("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(16),
        });

        let port: u16 = get("SERVER_PORT")
            .or_else(|| get("PORT"))
            .map(|p| p.parse().with_context(|| format!("invalid port {p:?}")))
            .transpose()?
            .unwrap_or(5000);

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect());

        Ok(Self {
            auth: AuthConfig {
                jwt_secret,
                token_ttl_secs,
                cookie_secure,
            },
            database,
            server: ServerConfig {
                host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                cors_origins,
            },
        })
    }
}
