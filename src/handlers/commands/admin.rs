//! Admin command handlers

use teloxide::{Bot, types::{Message, InlineKeyboardMarkup, InlineKeyboardButton, ChatId}, prelude::*};
use tracing::{info, debug, warn};
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;
use crate::services::ServiceFactory;
use super::sender_id;

/// Handle /admin command - show admin panel
pub async fn handle_admin_panel(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    debug!(user_id = user_id, chat_id = ?chat_id, "Processing /admin command");

    if !services.is_admin(user_id) {
        warn!(user_id = user_id, "Unauthorized /admin attempt");
        bot.send_message(chat_id, "❌ This command is only available to admins.").await?;
        return Ok(());
    }

    show_admin_main_menu(bot, chat_id).await?;
    info!(user_id = user_id, "Admin accessed admin panel");

    Ok(())
}

/// Show admin main menu
async fn show_admin_main_menu(bot: Bot, chat_id: ChatId) -> Result<()> {
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📊 Statistics", "admin:stats"),
            InlineKeyboardButton::callback("👥 Members", "admin:members"),
        ],
        vec![
            InlineKeyboardButton::callback("🤖 Client bots", "admin:bots"),
            InlineKeyboardButton::callback("📢 Broadcast", "admin:broadcast"),
        ],
    ]);

    bot.send_message(chat_id, "🛠 Admin Panel\n\nChoose a section:")
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Handle /stats command - show aggregate statistics
pub async fn handle_stats(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    if !services.is_admin(user_id) {
        bot.send_message(chat_id, "❌ This command is only available to admins.").await?;
        return Ok(());
    }

    log_admin_action(user_id, "stats", None);
    show_stats(bot, chat_id, &services).await
}

/// Render the statistics view; shared by /stats and the admin panel
pub async fn show_stats(bot: Bot, chat_id: ChatId, services: &ServiceFactory) -> Result<()> {
    let members = services.db.members.count().await?;
    let broadcasts = services.broadcast.stats().await?;
    let bots = services.registry.stats().await?;
    let running = services.runner.running_ids().await.len();

    let text = format!(
        "📊 Bot Statistics\n\n\
        👥 Members: {}\n\n\
        📢 Broadcasts: {}\n\
        • Messages delivered: {}\n\
        • Messages failed: {}\n\n\
        🤖 Client bots: {}\n\
        • Enabled: {}\n\
        • Running: {}\n\
        • Pending approval: {}",
        members,
        broadcasts.total_broadcasts,
        broadcasts.total_sent,
        broadcasts.total_failed,
        bots.total_bots,
        bots.enabled_bots,
        running,
        bots.pending_approvals,
    );

    bot.send_message(chat_id, text).await?;

    Ok(())
}

/// Render the recent members view for the admin panel
pub async fn show_members(bot: Bot, chat_id: ChatId, services: &ServiceFactory) -> Result<()> {
    let total = services.db.members.count().await?;
    let recent = services.db.members.recent(10).await?;

    let mut text = format!("👥 Members: {}\n\nMost recent:\n", total);
    if recent.is_empty() {
        text.push_str("(none yet)");
    }
    for member in &recent {
        text.push_str(&format!(
            "• {} (id {}), joined {}\n",
            member.display_name(),
            member.telegram_id,
            member.joined_at.format("%Y-%m-%d"),
        ));
    }

    bot.send_message(chat_id, text).await?;

    Ok(())
}

/// Render the client bot overview for the admin panel
pub async fn show_bots(bot: Bot, chat_id: ChatId, services: &ServiceFactory) -> Result<()> {
    let bots = services.registry.list_all().await?;

    if bots.is_empty() {
        bot.send_message(chat_id, "🤖 No client bots registered.").await?;
        return Ok(());
    }

    let mut text = String::from("🤖 Client bots:\n");
    for client_bot in &bots {
        let running = services.runner.is_running(client_bot.id).await;
        text.push_str(&format!(
            "\n• #{} @{} — {}{}\n  owner: {}",
            client_bot.id,
            client_bot.bot_username.as_deref().unwrap_or("unknown"),
            client_bot.status(),
            if running { ", running" } else { "" },
            client_bot.owner_id,
        ));
    }

    bot.send_message(chat_id, text).await?;

    Ok(())
}
