//! Callback query handlers
//!
//! Inline keyboard callbacks for broadcast confirmation and the admin panel.
//! Callback data uses the "section:action" format.

use teloxide::{Bot, types::{CallbackQuery, ChatId}, prelude::*};
use tracing::{info, debug, warn};
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;
use crate::services::ServiceFactory;
use crate::handlers::commands::{admin, broadcast};

/// Main callback query dispatcher
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, services: ServiceFactory) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user_id));

    let Some(data) = query.data.clone() else {
        return Ok(());
    };

    debug!(user_id = user_id, callback_data = %data, "Processing callback query");

    // Answer first so the client drops the loading spinner
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    match data.as_str() {
        "broadcast:confirm" => confirm_broadcast(bot, chat_id, user_id, &services).await,
        "broadcast:cancel" => cancel_broadcast(bot, chat_id, user_id, &services).await,
        "admin:stats" if services.is_admin(user_id) => {
            log_admin_action(user_id, "stats", None);
            admin::show_stats(bot, chat_id, &services).await
        }
        "admin:members" if services.is_admin(user_id) => {
            admin::show_members(bot, chat_id, &services).await
        }
        "admin:bots" if services.is_admin(user_id) => {
            admin::show_bots(bot, chat_id, &services).await
        }
        "admin:broadcast" if services.is_admin(user_id) => {
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
        _ => {
            warn!(user_id = user_id, callback_data = %data, "Unknown callback data");
            Ok(())
        }
    }
}

/// Run the pending broadcast after the admin pressed confirm
async fn confirm_broadcast(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    services: &ServiceFactory,
) -> Result<()> {
    if !services.is_admin(user_id) {
        return Ok(());
    }

    let Some(pending) = services.broadcast.take_pending(user_id) else {
        bot.send_message(chat_id, "There is no pending broadcast.").await?;
        return Ok(());
    };

    info!(user_id = user_id, "Admin confirmed broadcast");
    bot.send_message(chat_id, "📤 Broadcasting…").await?;

    let sender = services.master_sender();
    match services
        .broadcast
        .broadcast_to_members(&sender, user_id, &pending.message_text)
        .await
    {
        Ok(outcome) => {
            bot.send_message(chat_id, broadcast::outcome_summary(&outcome)).await?;
        }
        Err(e) => {
            broadcast::report_broadcast_error(&bot, chat_id, e).await?;
        }
    }

    Ok(())
}

/// Drop the pending broadcast after the admin pressed cancel
async fn cancel_broadcast(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    services: &ServiceFactory,
) -> Result<()> {
    services.broadcast.clear_pending(user_id);
    info!(user_id = user_id, "Broadcast cancelled");
    bot.send_message(chat_id, "🚫 Broadcast cancelled.").await?;
    Ok(())
}
