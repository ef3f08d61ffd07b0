//! Configuration management for the Gôndola backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with GONDOLA__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::alerts::AlertSettings;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Generative AI provider configuration
    pub ai: AiConfig,

    /// Alert rule windows and multipliers
    pub alerts: AlertSettings,

    /// Periodic analysis configuration
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Gemini API key; AI features fall back to canned text when empty
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Whether the periodic analysis runs
    pub enabled: bool,

    /// Seconds between two analysis runs
    pub interval_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("GONDOLA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 86400)?
            .set_default("ai.api_key", "")?
            .set_default("ai.model", "gemini-pro")?
            .set_default(
                "ai.base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("ai.timeout_secs", 30)?
            .set_default("alerts.rupture_window_days", 7)?
            .set_default("alerts.rupture_cover_days", 3.0)?
            .set_default("alerts.excess_window_days", 30)?
            .set_default("alerts.excess_cover_months", 2.0)?
            .set_default("alerts.validity_horizon_days", 30)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.interval_secs", 6 * 60 * 60)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (GONDOLA__ prefix)
            .add_source(
                Environment::with_prefix("GONDOLA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config
            .alerts
            .validate()
            .map_err(|e| ConfigError::Message(format!("alerts: {}", e)))?;
        if config.scheduler.interval_secs == 0 {
            return Err(ConfigError::Message(
                "scheduler.interval_secs must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}
