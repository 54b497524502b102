use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

/// Signing secrets and lifetimes for the two token kinds. Access tokens are
/// short-lived and stateless; refresh tokens are long-lived and tracked in
/// the revocation store.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_secret: String,
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            database_url: require("DATABASE_URL")?,
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            auth: AuthConfig {
                jwt_secret: require("JWT_SECRET")?,
                access_ttl_secs: parse_secs("JWT_EXPIRES_IN", 900)?,
                refresh_secret: require("REFRESH_SECRET")?,
                refresh_ttl_secs: parse_secs("REFRESH_EXPIRES_IN", 604_800)?,
            },
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn parse_secs(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidVar(name, raw)),
        Err(_) => Ok(default),
    }
}
