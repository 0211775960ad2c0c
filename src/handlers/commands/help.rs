//! Help command handler

use teloxide::{Bot, types::Message, prelude::*};
use crate::utils::errors::Result;
use crate::services::ServiceFactory;
use super::sender_id;

/// Handle /help command - show the command list, with admin commands for admins
pub async fn handle_help(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user_id = sender_id(&msg)?;

    let mut help_text = String::from(
        "🤖 RelayBot Help\n\n\
        Send any message to chat with the assistant.\n\n\
        General commands:\n\
        /start - Start the bot\n\
        /help - Show this help\n\
        /persona <name> - Choose your chat persona\n\n\
        Your bots:\n\
        /registerbot <token> - Register your own bot\n\
        /mybots - List your registered bots\n\
        /enablebot <id> - Start an approved bot\n\
        /disablebot <id> - Stop a running bot\n\
        /removebot <id> - Remove one of your bots\n\
        /broadcastbot <id> <text> - Message your bot's users",
    );

    if services.is_admin(user_id) {
        help_text.push_str(
            "\n\nAdmin commands:\n\
            /broadcast - Broadcast to all members\n\
            /history - Recent broadcasts\n\
            /admin - Admin panel\n\
            /stats - Bot statistics\n\
            /pendingbots - Bots awaiting approval\n\
            /approvebot <id> - Approve a client bot",
        );
    }

    bot.send_message(msg.chat.id, help_text).await?;

    Ok(())
}
