//! Message handlers
//!
//! Plain text messages either complete a broadcast composition (admins in
//! composing mode) or get relayed to the chat API with the member's persona.

use teloxide::{Bot, types::{Message, InlineKeyboardMarkup, InlineKeyboardButton}, prelude::*};
use tracing::{info, debug, error};
use crate::utils::errors::{RelayBotError, Result};
use crate::services::ServiceFactory;
use crate::services::broadcast::validate_message;
use crate::models::member::TrackMemberRequest;

/// Handle incoming text messages on the master bot
pub async fn handle_message(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        RelayBotError::InvalidInput("No user in message".to_string())
    })?;

    let user_id = user.id.0 as i64;
    let chat_id = msg.chat.id;

    if !chat_id.is_user() {
        return Ok(());
    }

    let Some(text) = msg.text().map(|t| t.to_owned()) else {
        return Ok(());
    };

    debug!(user_id = user_id, "Processing message");

    if services.is_admin(user_id) && services.broadcast.is_composing(user_id) {
        return handle_broadcast_body(bot, msg, user_id, &text, &services).await;
    }

    handle_chat_message(bot, msg, user_id, &text, &services).await
}

/// Capture a broadcast body from an admin in composing mode
async fn handle_broadcast_body(
    bot: Bot,
    msg: Message,
    user_id: i64,
    text: &str,
    services: &ServiceFactory,
) -> Result<()> {
    let chat_id = msg.chat.id;

    if text.trim() == "/cancel" {
        services.broadcast.clear_pending(user_id);
        info!(user_id = user_id, "Broadcast composition cancelled");
        bot.send_message(chat_id, "🚫 Broadcast cancelled.").await?;
        return Ok(());
    }

    if let Err(RelayBotError::InvalidInput(reason)) = validate_message(text) {
        bot.send_message(chat_id, format!("❌ {}\n\nSend another message, or /cancel.", reason))
            .await?;
        return Ok(());
    }

    services.broadcast.save_pending(user_id, text.to_string());
    let recipients = services.db.members.count().await?;

    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Send", "broadcast:confirm"),
        InlineKeyboardButton::callback("❌ Cancel", "broadcast:cancel"),
    ]]);

    bot.send_message(
        chat_id,
        format!("📢 Preview ({} recipients):\n\n{}", recipients, text),
    )
    .reply_markup(keyboard)
    .await?;

    Ok(())
}

/// Relay a member message to the chat API and reply with the answer
async fn handle_chat_message(
    bot: Bot,
    msg: Message,
    user_id: i64,
    text: &str,
    services: &ServiceFactory,
) -> Result<()> {
    let chat_id = msg.chat.id;

    if let Some(user) = msg.from.as_ref() {
        let request = TrackMemberRequest {
            telegram_id: user_id,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
            last_name: user.last_name.clone(),
        };
        match services.db.members.track(request).await {
            Ok((member, true)) => {
                info!(user_id = user_id, "New member joined via message");
                let total = services.db.members.count().await?;
                if let Err(e) = services.notifier.notify_new_member(&member, total).await {
                    error!(error = %e, "Failed to notify admins about new member");
                }
            }
            Ok((_, false)) => {}
            Err(e) => error!(error = %e, user_id = user_id, "Failed to track member"),
        }
    }

    let persona = services
        .db
        .members
        .persona(user_id)
        .await?
        .unwrap_or_else(|| services.chat.default_persona().to_string());

    match services.chat.ask(text, &persona).await {
        Ok(reply) => {
            bot.send_message(chat_id, reply).await?;
        }
        Err(e) => {
            error!(user_id = user_id, error = %e, "Chat relay failed");
            bot.send_message(
                chat_id,
                "⚠️ The assistant is unavailable right now. Please try again later.",
            )
            .await?;
        }
    }

    Ok(())
}
