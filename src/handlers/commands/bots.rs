//! Client bot registry command handlers
//!
//! Registration, approval and lifecycle commands for user-owned bots.

use teloxide::{Bot, types::Message, prelude::*};
use tracing::{info, warn, error};
use crate::utils::errors::{RelayBotError, Result};
use crate::utils::logging::log_admin_action;
use crate::services::ServiceFactory;
use crate::services::telegram::verify_token;
use crate::models::client_bot::RegisterBotRequest;
use super::sender_id;

/// Handle /registerbot command - verify the token and file the registration
pub async fn handle_register(
    bot: Bot,
    msg: Message,
    token: String,
    services: ServiceFactory,
) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        RelayBotError::InvalidInput("No user in message".to_string())
    })?;
    let user_id = user.id.0 as i64;
    let chat_id = msg.chat.id;
    let token = token.trim().to_string();

    if !chat_id.is_user() {
        bot.send_message(chat_id, "Please register bots in a private chat.").await?;
        return Ok(());
    }

    if token.is_empty() {
        bot.send_message(chat_id, "Usage: /registerbot <bot token from @BotFather>").await?;
        return Ok(());
    }

    let profile = match verify_token(&token).await {
        Ok(profile) => profile,
        Err(RelayBotError::InvalidBotToken(reason)) => {
            warn!(user_id = user_id, reason = %reason, "Bot token verification failed");
            bot.send_message(
                chat_id,
                "❌ That token was rejected by Telegram. Check it and try again.",
            )
            .await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let request = RegisterBotRequest {
        token,
        bot_username: profile.username.clone(),
        bot_first_name: Some(profile.first_name.clone()),
        owner_id: user_id,
        owner_username: user.username.clone(),
    };

    let registered = match services.registry.register(request).await {
        Ok(registered) => registered,
        Err(RelayBotError::TokenAlreadyRegistered) => {
            bot.send_message(chat_id, "❌ This bot token is already registered.").await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    info!(user_id = user_id, bot_id = registered.id, "Client bot registered");

    if let Err(e) = services.notifier.notify_registration(&registered).await {
        error!(error = %e, "Failed to notify admins about bot registration");
    }

    bot.send_message(
        chat_id,
        format!(
            "✅ Bot @{} registered as #{}.\n\nAn admin has to approve it before you can enable it.",
            registered.bot_username.as_deref().unwrap_or("unknown"),
            registered.id,
        ),
    )
    .await?;

    Ok(())
}

/// Handle /approvebot command (admin only)
pub async fn handle_approve(bot: Bot, msg: Message, arg: String, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    if !services.is_admin(user_id) {
        bot.send_message(chat_id, "❌ This command is only available to admins.").await?;
        return Ok(());
    }

    let Some(bot_id) = parse_bot_id(&arg) else {
        bot.send_message(chat_id, "Usage: /approvebot <bot id>").await?;
        return Ok(());
    };

    match services.registry.approve(bot_id).await {
        Ok(approved) => {
            log_admin_action(user_id, "approve_bot", Some(&bot_id.to_string()));
            bot.send_message(
                chat_id,
                format!(
                    "✅ Bot #{} (@{}) approved. The owner can now /enablebot {}.",
                    approved.id,
                    approved.bot_username.as_deref().unwrap_or("unknown"),
                    approved.id,
                ),
            )
            .await?;
        }
        Err(RelayBotError::BotNotFound { .. }) => {
            bot.send_message(chat_id, format!("❌ Bot {} is not registered.", bot_id)).await?;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Handle /enablebot command - mark the bot enabled and start its dispatcher
pub async fn handle_enable(bot: Bot, msg: Message, arg: String, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    let Some(bot_id) = parse_bot_id(&arg) else {
        bot.send_message(chat_id, "Usage: /enablebot <bot id>").await?;
        return Ok(());
    };

    let Some(client_bot) = owned_bot(&bot, &msg, bot_id, &services).await? else {
        return Ok(());
    };

    if !client_bot.is_approved {
        bot.send_message(chat_id, format!("❌ Bot {} has not been approved yet.", bot_id)).await?;
        return Ok(());
    }

    if services.runner.is_running(bot_id).await {
        bot.send_message(chat_id, format!("▶️ Bot {} is already running.", bot_id)).await?;
        return Ok(());
    }

    let enabled = services.registry.enable(bot_id).await?;
    services.runner.start(&enabled).await?;

    info!(user_id = user_id, bot_id = bot_id, "Client bot enabled");
    bot.send_message(
        chat_id,
        format!("▶️ Bot @{} is now running.", enabled.bot_username.as_deref().unwrap_or("unknown")),
    )
    .await?;

    Ok(())
}

/// Handle /disablebot command - stop the dispatcher and mark the bot disabled
pub async fn handle_disable(bot: Bot, msg: Message, arg: String, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    let Some(bot_id) = parse_bot_id(&arg) else {
        bot.send_message(chat_id, "Usage: /disablebot <bot id>").await?;
        return Ok(());
    };

    let Some(_client_bot) = owned_bot(&bot, &msg, bot_id, &services).await? else {
        return Ok(());
    };

    if services.runner.is_running(bot_id).await {
        services.runner.stop(bot_id).await?;
    }
    let disabled = services.registry.disable(bot_id).await?;

    info!(user_id = user_id, bot_id = bot_id, "Client bot disabled");
    bot.send_message(
        chat_id,
        format!("⏸ Bot @{} stopped.", disabled.bot_username.as_deref().unwrap_or("unknown")),
    )
    .await?;

    Ok(())
}

/// Handle /removebot command - stop the bot if running and delete the registration
pub async fn handle_remove(bot: Bot, msg: Message, arg: String, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    let Some(bot_id) = parse_bot_id(&arg) else {
        bot.send_message(chat_id, "Usage: /removebot <bot id>").await?;
        return Ok(());
    };

    let Some(client_bot) = owned_bot(&bot, &msg, bot_id, &services).await? else {
        return Ok(());
    };

    if services.runner.is_running(bot_id).await {
        services.runner.stop(bot_id).await?;
    }
    services.registry.remove(bot_id).await?;

    info!(user_id = user_id, bot_id = bot_id, "Client bot removed");
    bot.send_message(
        chat_id,
        format!("🗑 Bot @{} removed.", client_bot.bot_username.as_deref().unwrap_or("unknown")),
    )
    .await?;

    Ok(())
}

/// Handle /mybots command - list the caller's registered bots
pub async fn handle_my_bots(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    let bots = services.registry.list_by_owner(user_id).await?;

    if bots.is_empty() {
        bot.send_message(chat_id, "You have no registered bots. Use /registerbot <token> to add one.")
            .await?;
        return Ok(());
    }

    let mut text = String::from("🤖 Your bots:\n");
    for client_bot in &bots {
        let running = services.runner.is_running(client_bot.id).await;
        text.push_str(&format!(
            "\n• #{} @{} — {}{}",
            client_bot.id,
            client_bot.bot_username.as_deref().unwrap_or("unknown"),
            client_bot.status(),
            if running { ", running" } else { "" },
        ));
    }

    bot.send_message(chat_id, text).await?;

    Ok(())
}

/// Handle /pendingbots command (admin only)
pub async fn handle_pending_bots(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;

    if !services.is_admin(user_id) {
        bot.send_message(chat_id, "❌ This command is only available to admins.").await?;
        return Ok(());
    }

    let pending = services.registry.list_pending().await?;

    if pending.is_empty() {
        bot.send_message(chat_id, "✅ No bots awaiting approval.").await?;
        return Ok(());
    }

    let mut text = String::from("⏳ Awaiting approval:\n");
    for client_bot in &pending {
        text.push_str(&format!(
            "\n• #{} @{} — owner {}\n  /approvebot {}",
            client_bot.id,
            client_bot.bot_username.as_deref().unwrap_or("unknown"),
            client_bot.owner_id,
            client_bot.id,
        ));
    }

    bot.send_message(chat_id, text).await?;

    Ok(())
}

fn parse_bot_id(arg: &str) -> Option<i64> {
    arg.trim().parse::<i64>().ok()
}

/// Fetch the bot and enforce owner-or-admin access. Replies and returns
/// `None` when the caller may not manage it.
async fn owned_bot(
    bot: &Bot,
    msg: &Message,
    bot_id: i64,
    services: &ServiceFactory,
) -> Result<Option<crate::models::client_bot::ClientBot>> {
    let user_id = sender_id(msg)?;
    let chat_id = msg.chat.id;

    let client_bot = match services.registry.get(bot_id).await {
        Ok(client_bot) => client_bot,
        Err(RelayBotError::BotNotFound { .. }) => {
            bot.send_message(chat_id, format!("❌ Bot {} is not registered.", bot_id)).await?;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if client_bot.owner_id != user_id && !services.is_admin(user_id) {
        warn!(user_id = user_id, bot_id = bot_id, "Unauthorized client bot management attempt");
        bot.send_message(chat_id, "❌ You do not own this bot.").await?;
        return Ok(None);
    }

    Ok(Some(client_bot))
}
