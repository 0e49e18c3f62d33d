use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MODEL_RELOAD_DELAY, DEFAULT_SYNC_INTERVAL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Forum source
    pub forum_base_url: String,
    pub forum_api_token: Option<String>,
    pub fetch_timeout: Duration,

    // Courses to keep in sync
    pub course_ids: Vec<String>,

    // Database
    pub database_path: PathBuf,

    // Background sync
    pub sync_interval: Duration,

    // Recommendation cache
    pub model_reload_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            forum_base_url: required_env("FORUM_BASE_URL")?,
            forum_api_token: optional_env("FORUM_API_TOKEN"),
            fetch_timeout: Duration::from_secs(parse_env_u64(
                "FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT.as_secs(),
            )?),

            course_ids: parse_course_ids(&env_or_default("COURSE_IDS", "")),

            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/forum.sqlite")),

            sync_interval: Duration::from_secs(parse_env_u64(
                "SYNC_INTERVAL_SECS",
                DEFAULT_SYNC_INTERVAL.as_secs(),
            )?),

            model_reload_delay: Duration::from_secs(parse_env_u64(
                "MODEL_RELOAD_DELAY_SECS",
                DEFAULT_MODEL_RELOAD_DELAY.as_secs(),
            )?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forum_base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "FORUM_BASE_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if !self.forum_base_url.starts_with("http") {
            return Err(ConfigError::InvalidValue {
                name: "FORUM_BASE_URL".to_string(),
                message: "must be an http(s) URL".to_string(),
            });
        }
        if self.course_ids.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "COURSE_IDS".to_string(),
                message: "at least one course id is required".to_string(),
            });
        }
        if self.sync_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "SYNC_INTERVAL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// A configuration suitable for tests: no real forum, throwaway paths.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            forum_base_url: "http://127.0.0.1:0".to_string(),
            forum_api_token: None,
            fetch_timeout: Duration::from_secs(5),
            course_ids: vec!["test_course".to_string()],
            database_path: PathBuf::from(":memory:"),
            sync_interval: Duration::from_secs(1),
            model_reload_delay: DEFAULT_MODEL_RELOAD_DELAY,
        }
    }
}

fn parse_course_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
