//! Client bot runner
//!
//! Enabled client bots run as in-process teloxide dispatchers. The runner
//! keeps a shutdown token per running bot so disable/remove can stop them.

use std::collections::HashMap;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::dispatching::ShutdownToken;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use crate::database::repositories::ClientUserRepository;
use crate::handlers::client::{self, ClientBotContext};
use crate::models::client_bot::ClientBot;
use crate::services::chat::ChatApiClient;
use crate::utils::errors::{RelayBotError, Result};

#[derive(Clone)]
pub struct BotRunner {
    client_users: ClientUserRepository,
    chat: ChatApiClient,
    running: Arc<Mutex<HashMap<i64, ShutdownToken>>>,
}

impl BotRunner {
    pub fn new(client_users: ClientUserRepository, chat: ChatApiClient) -> Self {
        Self {
            client_users,
            chat,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Spawn a dispatcher for one client bot
    pub async fn start(&self, registration: &ClientBot) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.contains_key(&registration.id) {
            return Err(RelayBotError::InvalidInput(format!(
                "Client bot {} is already running",
                registration.id
            )));
        }

        let bot = Bot::new(&registration.token);
        let context = ClientBotContext {
            bot_id: registration.id,
            client_users: self.client_users.clone(),
            chat: self.chat.clone(),
        };

        let mut dispatcher = Dispatcher::builder(bot, client::schema())
            .dependencies(dptree::deps![context])
            .default_handler(|upd| async move {
                warn!("Unhandled client bot update: {:?}", upd);
            })
            .build();

        let token = dispatcher.shutdown_token();
        let bot_id = registration.id;
        tokio::spawn(async move {
            dispatcher.dispatch().await;
            info!(bot_id = bot_id, "Client bot dispatcher exited");
        });

        running.insert(bot_id, token);
        info!(bot_id = bot_id, username = ?registration.bot_username, "Client bot started");
        Ok(())
    }

    /// Stop a running client bot
    pub async fn stop(&self, bot_id: i64) -> Result<()> {
        let token = self
            .running
            .lock()
            .await
            .remove(&bot_id)
            .ok_or_else(|| {
                RelayBotError::InvalidInput(format!("Client bot {} is not running", bot_id))
            })?;

        match token.shutdown() {
            Ok(wait) => {
                wait.await;
                info!(bot_id = bot_id, "Client bot stopped");
            }
            Err(e) => {
                warn!(bot_id = bot_id, error = %e, "Client bot dispatcher was already idle");
            }
        }

        Ok(())
    }

    pub async fn is_running(&self, bot_id: i64) -> bool {
        self.running.lock().await.contains_key(&bot_id)
    }

    pub async fn running_ids(&self) -> Vec<i64> {
        self.running.lock().await.keys().copied().collect()
    }

    /// Start every bot in the list, tolerating individual failures.
    /// Returns how many actually started.
    pub async fn start_all(&self, bots: &[ClientBot]) -> usize {
        let mut started = 0;
        for bot in bots {
            match self.start(bot).await {
                Ok(()) => started += 1,
                Err(e) => {
                    error!(bot_id = bot.id, error = %e, "Failed to start client bot");
                }
            }
        }
        started
    }
}
