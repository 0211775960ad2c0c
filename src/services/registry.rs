//! Client bot registry service
//!
//! Lifecycle rules over client bot registrations: register pending, approve,
//! enable only after approval, disable, remove.

use tracing::info;
use crate::database::repositories::ClientBotRepository;
use crate::models::client_bot::{ClientBot, ClientBotStats, RegisterBotRequest};
use crate::utils::errors::{RelayBotError, Result};

#[derive(Debug, Clone)]
pub struct RegistryService {
    repo: ClientBotRepository,
}

impl RegistryService {
    pub fn new(repo: ClientBotRepository) -> Self {
        Self { repo }
    }

    /// Register a new client bot, pending admin approval. The token must
    /// already have been verified against the Telegram API.
    pub async fn register(&self, request: RegisterBotRequest) -> Result<ClientBot> {
        if self.repo.find_by_token(&request.token).await?.is_some() {
            return Err(RelayBotError::TokenAlreadyRegistered);
        }

        let bot = self.repo.create(request).await?;
        info!(bot_id = bot.id, owner_id = bot.owner_id, "Client bot registered, pending approval");
        Ok(bot)
    }

    pub async fn get(&self, bot_id: i64) -> Result<ClientBot> {
        self.repo
            .find_by_id(bot_id)
            .await?
            .ok_or(RelayBotError::BotNotFound { bot_id })
    }

    pub async fn approve(&self, bot_id: i64) -> Result<ClientBot> {
        let bot = self
            .repo
            .approve(bot_id)
            .await?
            .ok_or(RelayBotError::BotNotFound { bot_id })?;

        info!(bot_id = bot_id, "Client bot approved");
        Ok(bot)
    }

    /// Enable a bot. Fails for unapproved registrations.
    pub async fn enable(&self, bot_id: i64) -> Result<ClientBot> {
        let bot = self.get(bot_id).await?;
        if !bot.is_approved {
            return Err(RelayBotError::BotNotApproved { bot_id });
        }

        let bot = self
            .repo
            .set_enabled(bot_id, true)
            .await?
            .ok_or(RelayBotError::BotNotFound { bot_id })?;

        info!(bot_id = bot_id, "Client bot enabled");
        Ok(bot)
    }

    pub async fn disable(&self, bot_id: i64) -> Result<ClientBot> {
        let bot = self
            .repo
            .set_enabled(bot_id, false)
            .await?
            .ok_or(RelayBotError::BotNotFound { bot_id })?;

        info!(bot_id = bot_id, "Client bot disabled");
        Ok(bot)
    }

    pub async fn remove(&self, bot_id: i64) -> Result<()> {
        if !self.repo.delete(bot_id).await? {
            return Err(RelayBotError::BotNotFound { bot_id });
        }

        info!(bot_id = bot_id, "Client bot removed");
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<ClientBot>> {
        self.repo.list_all().await
    }

    pub async fn list_pending(&self) -> Result<Vec<ClientBot>> {
        self.repo.list_pending().await
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ClientBot>> {
        self.repo.list_by_owner(owner_id).await
    }

    pub async fn list_enabled(&self) -> Result<Vec<ClientBot>> {
        self.repo.list_enabled().await
    }

    pub async fn stats(&self) -> Result<ClientBotStats> {
        self.repo.stats().await
    }
}
