//! Service configuration loaded from the process environment
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `4000` |
//! | `DATABASE_URL` | `memory://` |
//! | `LOG_FORMAT` | `pretty` |
//! | `BODY_LIMIT` | `10485760` |
//! | `CORS_ORIGINS` | empty (any origin) |

use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::store::StoreLocation;

/// Environment variables read by [`ServerConfig::from_env`]
pub const ENV_KEYS: [&str; 6] = [
    "HOST",
    "PORT",
    "DATABASE_URL",
    "LOG_FORMAT",
    "BODY_LIMIT",
    "CORS_ORIGINS",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Store connection string (`memory://` or `file://<path>`)
    pub database_url: String,
    pub log_format: LogFormat,
    /// Maximum accepted request body in bytes
    pub body_limit: usize,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            database_url: "memory://".to_string(),
            log_format: LogFormat::Pretty,
            body_limit: 10 * 1024 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| ENV_KEYS.contains(&key.as_str()))
            .collect();
        Self::from_vars(vars)
    }

    /// Load from an explicit variable map, falling back to defaults
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("database_url", defaults.database_url)?
            .set_default("log_format", "pretty")?
            .set_default("body_limit", defaults.body_limit as i64)?
            .set_default("cors_origins", Vec::<String>::new())?
            .add_source(
                Environment::default()
                    .source(Some(vars))
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()?;

        let mut loaded: Self = config.try_deserialize()?;
        loaded.cors_origins = loaded
            .cors_origins
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.body_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "BODY_LIMIT",
                message: "must be greater than zero".to_string(),
            });
        }
        self.database_url
            .parse::<StoreLocation>()
            .map_err(|e| ConfigError::Invalid {
                key: "DATABASE_URL",
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// `host:port` to bind the listener on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
