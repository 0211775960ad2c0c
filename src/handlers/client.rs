//! Client bot handlers
//!
//! Update handling for spawned client bot dispatchers: user tracking on
//! contact, a minimal command set, and chat relay for plain messages.

use teloxide::{Bot, types::{Message, Update}, prelude::*};
use teloxide::dispatching::UpdateHandler;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error};
use crate::database::repositories::ClientUserRepository;
use crate::models::client_bot::TrackClientUserRequest;
use crate::services::chat::ChatApiClient;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into each client bot dispatcher
#[derive(Clone)]
pub struct ClientBotContext {
    pub bot_id: i64,
    pub client_users: ClientUserRepository,
    pub chat: ChatApiClient,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Client Bot Commands")]
enum ClientCommand {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help information")]
    Help,
}

/// Update handler tree for one client bot
pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry().branch(
        Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<ClientCommand>()
                    .endpoint(handle_command),
            )
            .branch(dptree::endpoint(handle_chat_message)),
    )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: ClientCommand,
    context: ClientBotContext,
) -> HandlerResult {
    match cmd {
        ClientCommand::Start => {
            track_user(&context, &msg).await;

            let name = msg
                .from
                .as_ref()
                .map(|u| u.first_name.clone())
                .unwrap_or_else(|| "there".to_string());

            bot.send_message(
                msg.chat.id,
                format!(
                    "🤖 Welcome, {}!\n\nSend any message and I will answer.\nUse /help to see what I can do.",
                    name
                ),
            )
            .await?;
        }
        ClientCommand::Help => {
            bot.send_message(
                msg.chat.id,
                "Available commands:\n/start - Start the bot\n/help - Show this help\n\nSend any message to chat.",
            )
            .await?;
        }
    }

    Ok(())
}

async fn handle_chat_message(bot: Bot, msg: Message, context: ClientBotContext) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    track_user(&context, &msg).await;
    debug!(bot_id = context.bot_id, chat_id = ?msg.chat.id, "Relaying client bot message");

    match context.chat.ask(text, context.chat.default_persona()).await {
        Ok(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
        }
        Err(e) => {
            error!(bot_id = context.bot_id, error = %e, "Chat relay failed");
            bot.send_message(
                msg.chat.id,
                "⚠️ The assistant is unavailable right now. Please try again later.",
            )
            .await?;
        }
    }

    Ok(())
}

/// Record the user of this client bot; tracking failures never block replies
async fn track_user(context: &ClientBotContext, msg: &Message) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };

    let request = TrackClientUserRequest {
        bot_id: context.bot_id,
        telegram_id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
    };

    if let Err(e) = context.client_users.track(request).await {
        error!(bot_id = context.bot_id, error = %e, "Failed to track client bot user");
    }
}
