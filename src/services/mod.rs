//! Services module
//!
//! This module contains business logic services

pub mod broadcast;
pub mod chat;
pub mod notifier;
pub mod registry;
pub mod runner;
pub mod telegram;

// Re-export commonly used services
pub use broadcast::BroadcastService;
pub use chat::ChatApiClient;
pub use notifier::AdminNotifier;
pub use registry::RegistryService;
pub use runner::BotRunner;
pub use telegram::{BroadcastSender, BotProfile, SendError, TelegramSender, verify_token};

use teloxide::Bot;
use crate::config::settings::Settings;
use crate::database::{DatabasePool, DatabaseService};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub db: DatabaseService,
    pub broadcast: BroadcastService,
    pub registry: RegistryService,
    pub chat: ChatApiClient,
    pub runner: BotRunner,
    pub notifier: AdminNotifier,
    settings: Settings,
    bot: Bot,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(bot: Bot, settings: Settings, pool: DatabasePool) -> Result<Self> {
        let db = DatabaseService::new(pool);
        let broadcast = BroadcastService::new(
            db.members.clone(),
            db.client_users.clone(),
            db.broadcasts.clone(),
            settings.broadcast.clone(),
        );
        let registry = RegistryService::new(db.client_bots.clone());
        let chat = ChatApiClient::new(settings.chat_api.clone())?;
        let runner = BotRunner::new(db.client_users.clone(), chat.clone());
        let notifier = AdminNotifier::new(bot.clone(), settings.bot.admin_ids.clone());

        Ok(Self {
            db,
            broadcast,
            registry,
            chat,
            runner,
            notifier,
            settings,
            bot,
        })
    }

    /// Check if a user is a configured master admin
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.settings.bot.admin_ids.contains(&user_id)
    }

    /// Sender over the master bot for broadcast dispatch
    pub fn master_sender(&self) -> TelegramSender {
        TelegramSender::new(self.bot.clone())
    }

    /// Sender over one client bot's token
    pub fn client_sender(&self, token: &str) -> TelegramSender {
        TelegramSender::new(Bot::new(token))
    }
}
