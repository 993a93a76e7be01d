//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use study_tracker_core::stats::{
    ScoringPolicy, DEFAULT_COMPLETION_WEIGHT, DEFAULT_DOUBT_BONUS, DEFAULT_POMODORO_MULTIPLIER,
    DEFAULT_TASK_BONUS, DEFAULT_TIME_CAP_MINUTES, DEFAULT_TIME_WEIGHT,
};
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where study data is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    /// Process-local storage; everything is lost on restart.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub cors_origin: String,
    pub openai_api_key: Option<String>,
    pub recommendation_model: String,
    pub recommendation_timeout: Duration,
    pub tutor_model: String,
    pub tutor_timeout: Duration,
    pub scoring: ScoringPolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        // --- Storage ---
        let backend = lookup("STORAGE_BACKEND").unwrap_or_else(|| "postgres".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "postgres" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of 'postgres', 'memory'", other),
                ))
            }
        };
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5u32)?;

        // --- Recommendation gateway (optional) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        let recommendation_model =
            lookup("RECOMMENDATION_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let recommendation_timeout =
            Duration::from_secs(parse_or(&lookup, "RECOMMENDATION_TIMEOUT_SECS", 10u64)?);

        // --- AI tutor for doubts (optional, shares the API key) ---
        let tutor_model = lookup("TUTOR_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let tutor_timeout = Duration::from_secs(parse_or(&lookup, "TUTOR_TIMEOUT_SECS", 20u64)?);

        // --- Scoring policy ---
        let scoring = ScoringPolicy {
            pomodoro_multiplier: parse_or(
                &lookup,
                "SCORE_POMODORO_MULTIPLIER",
                DEFAULT_POMODORO_MULTIPLIER,
            )?,
            task_bonus: parse_or(&lookup, "SCORE_TASK_BONUS", DEFAULT_TASK_BONUS)?,
            doubt_bonus: parse_or(&lookup, "SCORE_DOUBT_BONUS", DEFAULT_DOUBT_BONUS)?,
            time_weight: parse_or(&lookup, "SCORE_TIME_WEIGHT", DEFAULT_TIME_WEIGHT)?,
            completion_weight: parse_or(
                &lookup,
                "SCORE_COMPLETION_WEIGHT",
                DEFAULT_COMPLETION_WEIGHT,
            )?,
            time_cap_minutes: parse_or(&lookup, "SCORE_TIME_CAP_MINUTES", DEFAULT_TIME_CAP_MINUTES)?,
        };

        Ok(Self {
            bind_address,
            storage,
            database_max_connections,
            log_level,
            cors_origin,
            openai_api_key,
            recommendation_model,
            recommendation_timeout,
            tutor_model,
            tutor_timeout,
            scoring,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
