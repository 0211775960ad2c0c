//! RelayBot Telegram Bot
//!
//! A master/client Telegram bot system: the master bot tracks members,
//! relays chat messages to an external chat API and broadcasts announcements
//! with bounded concurrency; members register their own client bots which,
//! once approved and enabled, run as additional dispatchers sharing the
//! same relay and broadcast machinery.

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{RelayBotError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
