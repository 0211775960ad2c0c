//! Telegram delivery seam
//!
//! Wraps the Telegram send path behind a trait so broadcast dispatch can be
//! driven by anything that delivers a message to a recipient. Also hosts
//! bot token verification for client bot registration.

use async_trait::async_trait;
use teloxide::{Bot, types::ChatId, prelude::*};
use teloxide::RequestError;
use thiserror::Error;
use crate::utils::errors::{RelayBotError, Result};

/// Delivery failure for a single attempt
#[derive(Error, Debug)]
pub enum SendError {
    /// Failure scoped to one recipient; the dispatch continues
    #[error("delivery to recipient failed: {0}")]
    Recipient(String),
    /// Provider-wide failure (e.g. rejected credentials); the dispatch aborts
    #[error("provider failure: {0}")]
    Fatal(String),
}

/// Anything that can deliver one message to one recipient
#[async_trait]
pub trait BroadcastSender: Send + Sync {
    async fn send(&self, recipient: i64, text: &str) -> std::result::Result<(), SendError>;
}

/// Production sender backed by a teloxide [`Bot`]
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl BroadcastSender for TelegramSender {
    async fn send(&self, recipient: i64, text: &str) -> std::result::Result<(), SendError> {
        self.bot
            .send_message(ChatId(recipient), text)
            .await
            .map(|_| ())
            .map_err(classify_send_error)
    }
}

/// Split Telegram errors into per-recipient failures and provider-wide ones.
/// A rejected token surfaces as an Unauthorized / Not Found API error and
/// would fail every remaining attempt the same way.
fn classify_send_error(err: RequestError) -> SendError {
    match &err {
        RequestError::Api(api) => {
            let text = api.to_string();
            if text.contains("Unauthorized") || text.contains("Not Found") {
                SendError::Fatal(text)
            } else {
                SendError::Recipient(text)
            }
        }
        _ => SendError::Recipient(err.to_string()),
    }
}

/// Bot identity returned by token verification
#[derive(Debug, Clone)]
pub struct BotProfile {
    pub username: Option<String>,
    pub first_name: String,
}

/// Verify a client bot token against the Telegram API before registration
pub async fn verify_token(token: &str) -> Result<BotProfile> {
    let bot = Bot::new(token);
    let me = bot
        .get_me()
        .await
        .map_err(|e| RelayBotError::InvalidBotToken(e.to_string()))?;

    Ok(BotProfile {
        username: me.user.username.clone(),
        first_name: me.user.first_name.clone(),
    })
}
