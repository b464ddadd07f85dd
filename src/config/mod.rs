//! Configuration module for the annotation backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Default name of the cookie carrying the session token.
pub const DEFAULT_SESSION_COOKIE: &str = "dash_session";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid DASH_BIND_ADDR {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid DASH_SESSION_TTL_SECS {value:?}: {source}")]
    SessionTtl {
        value: String,
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Name of the session cookie
    pub session_cookie: String,
    /// Session cookie lifetime in seconds
    pub session_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("DASH_DB_PATH")
            .unwrap_or_else(|_| "./data/annotations.sqlite".to_string())
            .into();

        let bind_value = env::var("DASH_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        let bind_addr = bind_value
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                value: bind_value.clone(),
                source,
            })?;

        let log_level = env::var("DASH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let session_cookie =
            env::var("DASH_SESSION_COOKIE").unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string());

        let ttl_value = env::var("DASH_SESSION_TTL_SECS").unwrap_or_else(|_| "7200".to_string());
        let session_ttl_secs = ttl_value
            .parse()
            .map_err(|source| ConfigError::SessionTtl {
                value: ttl_value.clone(),
                source,
            })?;

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            session_cookie,
            session_ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("DASH_DB_PATH");
        env::remove_var("DASH_BIND_ADDR");
        env::remove_var("DASH_LOG_LEVEL");
        env::remove_var("DASH_SESSION_COOKIE");
        env::remove_var("DASH_SESSION_TTL_SECS");

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/annotations.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.session_cookie, DEFAULT_SESSION_COOKIE);
        assert_eq!(config.session_ttl_secs, 7200);
    }
}
