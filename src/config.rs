//! Environment configuration.

use std::net::SocketAddr;

use crate::auth::Role;
use crate::db::DbConfig;

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "JWT_SECRET must be set to a secure, unique value in production. \
         Refusing to start with the default secret."
    )]
    InsecureJwtSecret,

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("invalid HOST/PORT configuration: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub admin_email: Option<String>,
    /// Bcrypt hash from ADMIN_HASH_PASSWORD.
    pub admin_password_hash: Option<String>,
    /// Plain ADMIN_PASSWORD, hashed at startup when no hash is given.
    pub admin_password: Option<String>,
    pub admin_role: Role,
    pub login_attempts_per_minute: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub database: Option<DbConfig>,
    pub upload_dir: String,
    pub public_base_url: String,
    pub auth: AuthConfig,
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 3001u16)?;

        let admin_role = match lookup("ADMIN_ROLE") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: "ADMIN_ROLE",
                value,
            })?,
            None => Role::Superuser,
        };

        let auth = AuthConfig {
            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            session_ttl_hours: parse_or(&lookup, "SESSION_TTL_HOURS", 24i64)?,
            admin_email: lookup("ADMIN_EMAIL"),
            admin_password_hash: lookup("ADMIN_HASH_PASSWORD"),
            admin_password: lookup("ADMIN_PASSWORD"),
            admin_role,
            login_attempts_per_minute: parse_or(&lookup, "LOGIN_ATTEMPTS_PER_MINUTE", 5u32)?,
        };

        // The pool reads its own DB_* settings; only presence of the URL matters here.
        let database = lookup("DATABASE_URL").map(|url| DbConfig {
            url,
            ..DbConfig::default()
        });

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port));

        Ok(Self {
            host,
            port,
            environment,
            database,
            upload_dir: lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            public_base_url,
            auth,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Refuses the default JWT secret in production.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && self.auth.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::InsecureJwtSecret);
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}
