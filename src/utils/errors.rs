//! Error handling for RelayBot
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for RelayBot application
#[derive(Error, Debug)]
pub enum RelayBotError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Chat API error: {0}")]
    ChatApi(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Client bot not found: {bot_id}")]
    BotNotFound { bot_id: i64 },

    #[error("Client bot not approved: {bot_id}")]
    BotNotApproved { bot_id: i64 },

    #[error("Bot token already registered")]
    TokenAlreadyRegistered,

    #[error("Invalid bot token: {0}")]
    InvalidBotToken(String),

    #[error("Broadcast aborted: {0}")]
    BroadcastAborted(String),
}

/// Result type alias for RelayBot operations
pub type Result<T> = std::result::Result<T, RelayBotError>;
