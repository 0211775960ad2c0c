//! Command handlers module
//!
//! Handlers for all master bot commands

pub mod start;
pub mod help;
pub mod broadcast;
pub mod admin;
pub mod bots;

use teloxide::{Bot, types::Message, utils::command::BotCommands};
use crate::utils::errors::Result;
use crate::services::ServiceFactory;

/// All available master bot commands
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "RelayBot commands:")]
pub enum Command {
    #[command(description = "Start the bot and show welcome message")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Set your chat persona")]
    Persona(String),
    #[command(description = "Broadcast a message to all members (admin only)")]
    Broadcast,
    #[command(description = "Show recent broadcasts (admin only)")]
    History,
    #[command(description = "Admin panel (admin only)")]
    Admin,
    #[command(description = "Show bot statistics (admin only)")]
    Stats,
    #[command(description = "Register your own bot: /registerbot <token>")]
    RegisterBot(String),
    #[command(description = "Approve a client bot (admin only)")]
    ApproveBot(String),
    #[command(description = "Enable an approved client bot")]
    EnableBot(String),
    #[command(description = "Disable a running client bot")]
    DisableBot(String),
    #[command(description = "Remove a client bot")]
    RemoveBot(String),
    #[command(description = "List your registered bots")]
    MyBots,
    #[command(description = "List bots awaiting approval (admin only)")]
    PendingBots,
    #[command(description = "Broadcast through a client bot: /broadcastbot <id> <text>")]
    BroadcastBot(String),
}

/// Main command dispatcher
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: ServiceFactory,
) -> Result<()> {
    match cmd {
        Command::Start => start::handle_start(bot, msg, services).await,
        Command::Help => help::handle_help(bot, msg, services).await,
        Command::Persona(persona) => start::handle_persona(bot, msg, persona, services).await,
        Command::Broadcast => broadcast::handle_broadcast(bot, msg, services).await,
        Command::History => broadcast::handle_history(bot, msg, services).await,
        Command::Admin => admin::handle_admin_panel(bot, msg, services).await,
        Command::Stats => admin::handle_stats(bot, msg, services).await,
        Command::RegisterBot(token) => bots::handle_register(bot, msg, token, services).await,
        Command::ApproveBot(arg) => bots::handle_approve(bot, msg, arg, services).await,
        Command::EnableBot(arg) => bots::handle_enable(bot, msg, arg, services).await,
        Command::DisableBot(arg) => bots::handle_disable(bot, msg, arg, services).await,
        Command::RemoveBot(arg) => bots::handle_remove(bot, msg, arg, services).await,
        Command::MyBots => bots::handle_my_bots(bot, msg, services).await,
        Command::PendingBots => bots::handle_pending_bots(bot, msg, services).await,
        Command::BroadcastBot(args) => broadcast::handle_broadcast_bot(bot, msg, args, services).await,
    }
}

/// Extract the sending user's id or fail the handler
pub(crate) fn sender_id(msg: &Message) -> Result<i64> {
    msg.from
        .as_ref()
        .map(|u| u.id.0 as i64)
        .ok_or_else(|| crate::utils::errors::RelayBotError::InvalidInput("No user in message".to_string()))
}
