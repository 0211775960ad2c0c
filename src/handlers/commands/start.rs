//! Start and persona command handlers
//!
//! Handles /start onboarding and the /persona preference command

use teloxide::{Bot, types::Message, prelude::*};
use tracing::{info, debug, error};
use crate::utils::errors::Result;
use crate::services::ServiceFactory;
use crate::models::member::TrackMemberRequest;
use super::sender_id;

/// Handle /start command - track the member and greet them
pub async fn handle_start(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        crate::utils::errors::RelayBotError::InvalidInput("No user in message".to_string())
    })?;

    let user_id = user.id.0 as i64;
    let chat_id = msg.chat.id;

    debug!(user_id = user_id, chat_id = ?chat_id, "Processing /start command");

    if !chat_id.is_user() {
        bot.send_message(chat_id, "Please talk to me in a private chat.").await?;
        return Ok(());
    }

    let request = TrackMemberRequest {
        telegram_id: user_id,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
    };

    let (member, is_new) = services.db.members.track(request).await?;

    if is_new {
        info!(user_id = user_id, "New member joined");
        let total = services.db.members.count().await?;
        if let Err(e) = services.notifier.notify_new_member(&member, total).await {
            error!(error = %e, "Failed to notify admins about new member");
        }
    }

    let welcome_text = format!(
        "👋 Welcome, {}!\n\n\
        Send me any message and I will answer.\n\n\
        • /persona <name> — choose how I talk to you\n\
        • /registerbot <token> — connect your own bot\n\
        • /help — full command list",
        member.display_name()
    );

    bot.send_message(chat_id, welcome_text).await?;

    Ok(())
}

/// Handle /persona command - show or update the member's chat persona
pub async fn handle_persona(
    bot: Bot,
    msg: Message,
    persona: String,
    services: ServiceFactory,
) -> Result<()> {
    let user_id = sender_id(&msg)?;
    let chat_id = msg.chat.id;
    let persona = persona.trim();

    if let Some(user) = msg.from.as_ref() {
        services
            .db
            .members
            .track(TrackMemberRequest {
                telegram_id: user_id,
                username: user.username.clone(),
                first_name: Some(user.first_name.clone()),
                last_name: user.last_name.clone(),
            })
            .await?;
    }

    if persona.is_empty() {
        let current = services
            .db
            .members
            .persona(user_id)
            .await?
            .unwrap_or_else(|| services.chat.default_persona().to_string());
        bot.send_message(
            chat_id,
            format!("🎭 Your current persona is \"{}\".\nUse /persona <name> to change it.", current),
        )
        .await?;
        return Ok(());
    }

    services.db.members.set_persona(user_id, persona).await?;
    info!(user_id = user_id, persona = %persona, "Member changed persona");

    bot.send_message(chat_id, format!("🎭 Persona set to \"{}\".", persona)).await?;

    Ok(())
}
