//! Client bot registry repository implementation

use chrono::Utc;
use crate::database::connection::DatabasePool;
use crate::models::client_bot::{ClientBot, ClientBotStats, RegisterBotRequest};
use crate::utils::errors::RelayBotError;

const SELECT_COLUMNS: &str = "id, token, bot_username, bot_first_name, owner_id, owner_username, is_approved, is_enabled, created_at";

#[derive(Debug, Clone)]
pub struct ClientBotRepository {
    pool: DatabasePool,
}

impl ClientBotRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert a new registration, pending approval
    pub async fn create(&self, request: RegisterBotRequest) -> Result<ClientBot, RelayBotError> {
        let bot = sqlx::query_as::<_, ClientBot>(
            r#"
            INSERT INTO client_bots
                (token, bot_username, bot_first_name, owner_id, owner_username, is_approved, is_enabled, created_at)
            VALUES (?, ?, ?, ?, ?, 0, 0, ?)
            RETURNING id, token, bot_username, bot_first_name, owner_id, owner_username, is_approved, is_enabled, created_at
            "#,
        )
        .bind(request.token)
        .bind(request.bot_username)
        .bind(request.bot_first_name)
        .bind(request.owner_id)
        .bind(request.owner_username)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(bot)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ClientBot>, RelayBotError> {
        let bot = sqlx::query_as::<_, ClientBot>(&format!(
            "SELECT {SELECT_COLUMNS} FROM client_bots WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bot)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<ClientBot>, RelayBotError> {
        let bot = sqlx::query_as::<_, ClientBot>(&format!(
            "SELECT {SELECT_COLUMNS} FROM client_bots WHERE token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bot)
    }

    /// Approve a registration
    pub async fn approve(&self, id: i64) -> Result<Option<ClientBot>, RelayBotError> {
        let bot = sqlx::query_as::<_, ClientBot>(&format!(
            "UPDATE client_bots SET is_approved = 1 WHERE id = ? RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bot)
    }

    /// Flip the enabled flag
    pub async fn set_enabled(&self, id: i64, enabled: bool) -> Result<Option<ClientBot>, RelayBotError> {
        let bot = sqlx::query_as::<_, ClientBot>(&format!(
            "UPDATE client_bots SET is_enabled = ? WHERE id = ? RETURNING {SELECT_COLUMNS}"
        ))
        .bind(enabled)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bot)
    }

    /// Remove a registration entirely
    pub async fn delete(&self, id: i64) -> Result<bool, RelayBotError> {
        let result = sqlx::query("DELETE FROM client_bots WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<ClientBot>, RelayBotError> {
        let bots = sqlx::query_as::<_, ClientBot>(&format!(
            "SELECT {SELECT_COLUMNS} FROM client_bots ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(bots)
    }

    pub async fn list_pending(&self) -> Result<Vec<ClientBot>, RelayBotError> {
        let bots = sqlx::query_as::<_, ClientBot>(&format!(
            "SELECT {SELECT_COLUMNS} FROM client_bots WHERE is_approved = 0 ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(bots)
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ClientBot>, RelayBotError> {
        let bots = sqlx::query_as::<_, ClientBot>(&format!(
            "SELECT {SELECT_COLUMNS} FROM client_bots WHERE owner_id = ? ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bots)
    }

    /// Bots that should be running: approved and enabled
    pub async fn list_enabled(&self) -> Result<Vec<ClientBot>, RelayBotError> {
        let bots = sqlx::query_as::<_, ClientBot>(&format!(
            "SELECT {SELECT_COLUMNS} FROM client_bots WHERE is_approved = 1 AND is_enabled = 1 ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(bots)
    }

    /// Aggregate statistics over the registry
    pub async fn stats(&self) -> Result<ClientBotStats, RelayBotError> {
        let stats = sqlx::query_as::<_, ClientBotStats>(
            r#"
            SELECT (SELECT COUNT(*) FROM client_bots) AS total_bots,
                   (SELECT COUNT(*) FROM client_bots WHERE is_approved = 1 AND is_enabled = 1) AS enabled_bots,
                   (SELECT COUNT(*) FROM client_bots WHERE is_approved = 0) AS pending_approvals
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::test_pool;

    fn register_request(token: &str, owner_id: i64) -> RegisterBotRequest {
        RegisterBotRequest {
            token: token.to_string(),
            bot_username: Some("demo_bot".to_string()),
            bot_first_name: Some("Demo".to_string()),
            owner_id,
            owner_username: Some("owner".to_string()),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_flags() {
        let pool = test_pool().await;
        let repo = ClientBotRepository::new(pool);

        let bot = repo.create(register_request("tok-1", 10)).await.unwrap();
        assert!(!bot.is_approved);
        assert!(!bot.is_enabled);
        assert_eq!(repo.list_pending().await.unwrap().len(), 1);

        let bot = repo.approve(bot.id).await.unwrap().unwrap();
        assert!(bot.is_approved);
        assert!(repo.list_pending().await.unwrap().is_empty());

        let bot = repo.set_enabled(bot.id, true).await.unwrap().unwrap();
        assert!(bot.is_enabled);
        assert_eq!(repo.list_enabled().await.unwrap().len(), 1);

        assert!(repo.delete(bot.id).await.unwrap());
        assert!(!repo.delete(bot.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_token_rejected_by_unique_index() {
        let pool = test_pool().await;
        let repo = ClientBotRepository::new(pool);

        repo.create(register_request("tok-1", 10)).await.unwrap();
        assert!(repo.create(register_request("tok-1", 11)).await.is_err());
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let pool = test_pool().await;
        let repo = ClientBotRepository::new(pool);

        let first = repo.create(register_request("tok-1", 10)).await.unwrap();
        repo.create(register_request("tok-2", 11)).await.unwrap();

        repo.approve(first.id).await.unwrap();
        repo.set_enabled(first.id, true).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_bots, 2);
        assert_eq!(stats.enabled_bots, 1);
        assert_eq!(stats.pending_approvals, 1);
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let pool = test_pool().await;
        let repo = ClientBotRepository::new(pool);

        repo.create(register_request("tok-1", 10)).await.unwrap();
        repo.create(register_request("tok-2", 20)).await.unwrap();

        let owned = repo.list_by_owner(10).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].owner_id, 10);
    }
}
