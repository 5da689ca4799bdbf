//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::util::rate_limit::UPDATE_RATE_LIMIT;
use crate::util::time::DEFAULT_TICK_RATE;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Map definition file; the built-in map is used when unset
    pub map_path: Option<PathBuf>,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Maximum number of joined players
    pub max_players: usize,
    /// Maximum number of RPCs handled at the same time
    pub max_concurrent_requests: usize,
    /// Update/shoot calls allowed per player per second
    pub update_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:12345".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            map_path: env::var("MAP_PATH").ok().map(PathBuf::from),
            tick_rate: parse_var("TICK_RATE", DEFAULT_TICK_RATE)?,
            max_players: parse_var("MAX_PLAYERS", 32)?,
            max_concurrent_requests: parse_var("MAX_CONCURRENT_REQUESTS", 10)?,
            update_rate_limit: parse_var("UPDATE_RATE_LIMIT", UPDATE_RATE_LIMIT)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 12345)),
            log_level: "info".to_string(),
            map_path: None,
            tick_rate: DEFAULT_TICK_RATE,
            max_players: 32,
            max_concurrent_requests: 10,
            update_rate_limit: UPDATE_RATE_LIMIT,
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
