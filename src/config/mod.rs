//! Configuration module
//!
//! Application settings loaded from TOML files and environment variables.

pub mod settings;
pub mod validation;

pub use settings::{Settings, BotConfig, DatabaseConfig, ChatApiConfig, BroadcastConfig, LoggingConfig};
