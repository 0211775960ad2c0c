//! Broadcast command handlers
//!
//! The master broadcast runs as a two-step flow: /broadcast arms composing
//! mode for the admin, the next text message becomes the pending broadcast
//! and is confirmed or cancelled through an inline keyboard.

use teloxide::{Bot, types::{Message, ChatId}, prelude::*};
use tracing::{info, warn};
use crate::utils::errors::{RelayBotError, Result};
use crate::services::ServiceFactory;
use crate::models::broadcast::BroadcastOutcome;
use super::sender_id;

/// Handle /broadcast command - arm composing mode for the admin
pub async fn handle_broadcast(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    if !services.is_admin(user_id) {
        warn!(user_id = user_id, "Unauthorized /broadcast attempt");
        bot.send_message(chat_id, "❌ This command is only available to admins.").await?;
        return Ok(());
    }

    let recipients = services.db.members.count().await?;
    services.broadcast.begin_composing(user_id);

    bot.send_message(
        chat_id,
        format!(
            "📢 Broadcast to {} members.\n\nSend the message text now, or /cancel to abort.",
            recipients
        ),
    )
    .await?;

    Ok(())
}

/// Handle /history command - show recent broadcasts
pub async fn handle_history(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    if !services.is_admin(user_id) {
        bot.send_message(chat_id, "❌ This command is only available to admins.").await?;
        return Ok(());
    }

    let records = services.broadcast.history(10).await?;

    if records.is_empty() {
        bot.send_message(chat_id, "📭 No broadcasts yet.").await?;
        return Ok(());
    }

    let mut text = String::from("📜 Recent broadcasts:\n");
    for record in &records {
        let scope = match record.bot_id {
            Some(bot_id) => format!("bot {}", bot_id),
            None => "members".to_string(),
        };
        text.push_str(&format!(
            "\n• {} | {} | sent {}/{} ({} failed)\n  {}",
            record.sent_at.format("%Y-%m-%d %H:%M"),
            scope,
            record.sent_count,
            record.total_count,
            record.failed_count,
            preview(&record.message_text),
        ));
    }

    bot.send_message(chat_id, text).await?;

    Ok(())
}

/// Handle /broadcastbot command - broadcast through a client bot
pub async fn handle_broadcast_bot(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    let Some((bot_id, text)) = parse_bot_broadcast_args(&args) else {
        bot.send_message(chat_id, "Usage: /broadcastbot <bot id> <message text>").await?;
        return Ok(());
    };

    let client_bot = match services.registry.get(bot_id).await {
        Ok(client_bot) => client_bot,
        Err(RelayBotError::BotNotFound { .. }) => {
            bot.send_message(chat_id, format!("❌ Bot {} is not registered.", bot_id)).await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if !client_bot.is_approved {
        bot.send_message(chat_id, format!("❌ Bot {} has not been approved yet.", bot_id)).await?;
        return Ok(());
    }

    let sender = services.client_sender(&client_bot.token);
    let result = services
        .broadcast
        .broadcast_for_bot(&sender, &client_bot, user_id, services.is_admin(user_id), text)
        .await;

    match result {
        Ok(outcome) => {
            info!(user_id = user_id, bot_id = bot_id, sent = outcome.sent, "Client broadcast finished");
            bot.send_message(chat_id, outcome_summary(&outcome)).await?;
        }
        Err(e) => {
            report_broadcast_error(&bot, chat_id, e).await?;
        }
    }

    Ok(())
}

/// Split "<bot id> <text>" into its parts
fn parse_bot_broadcast_args(args: &str) -> Option<(i64, &str)> {
    let args = args.trim();
    let (id_part, text) = args.split_once(char::is_whitespace)?;
    let bot_id = id_part.parse::<i64>().ok()?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some((bot_id, text))
}

/// One-line summary of a finished broadcast
pub fn outcome_summary(outcome: &BroadcastOutcome) -> String {
    format!(
        "✅ Broadcast finished.\n\n\
        • Recipients: {}\n\
        • Delivered: {}\n\
        • Failed: {}\n\
        • Success rate: {:.1}%",
        outcome.total,
        outcome.sent,
        outcome.failed,
        outcome.success_rate()
    )
}

/// Report a broadcast failure to the issuing chat; unexpected errors propagate
pub async fn report_broadcast_error(bot: &Bot, chat_id: ChatId, error: RelayBotError) -> Result<()> {
    match error {
        RelayBotError::BroadcastAborted(reason) => {
            bot.send_message(
                chat_id,
                format!("🛑 Broadcast aborted: {}\n\nNothing was recorded.", reason),
            )
            .await?;
            Ok(())
        }
        RelayBotError::InvalidInput(reason) => {
            bot.send_message(chat_id, format!("❌ {}", reason)).await?;
            Ok(())
        }
        RelayBotError::PermissionDenied(_) => {
            bot.send_message(chat_id, "❌ You do not own this bot.").await?;
            Ok(())
        }
        other => Err(other),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}…", cut)
    }
}
