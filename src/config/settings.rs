//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub chat_api: ChatApiConfig,
    pub broadcast: BroadcastConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub admin_ids: Vec<i64>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Chat relay API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub default_persona: String,
}

/// Broadcast dispatch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastConfig {
    /// Maximum number of in-flight delivery attempts
    pub concurrency: usize,
    /// Per-attempt delivery timeout; an elapsed attempt counts as failed
    pub send_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("RELAYBOT"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::RelayBotError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_ids: vec![],
            },
            database: DatabaseConfig {
                url: "sqlite://relaybot.db".to_string(),
                max_connections: 5,
            },
            chat_api: ChatApiConfig {
                base_url: "http://localhost:5000".to_string(),
                timeout_seconds: 30,
                default_persona: "assistant".to_string(),
            },
            broadcast: BroadcastConfig {
                concurrency: 8,
                send_timeout_seconds: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/relaybot".to_string(),
            },
        }
    }
}
