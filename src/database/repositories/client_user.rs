//! Client bot user repository implementation

use chrono::Utc;
use crate::database::connection::DatabasePool;
use crate::models::client_bot::{ClientBotUser, TrackClientUserRequest};
use crate::utils::errors::RelayBotError;

#[derive(Debug, Clone)]
pub struct ClientUserRepository {
    pool: DatabasePool,
}

impl ClientUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Record a user of one client bot. Returns the row and whether it is new.
    pub async fn track(&self, request: TrackClientUserRequest) -> Result<(ClientBotUser, bool), RelayBotError> {
        let existing = sqlx::query_as::<_, ClientBotUser>(
            "SELECT id, bot_id, telegram_id, username, first_name, joined_at FROM client_bot_users WHERE bot_id = ? AND telegram_id = ?"
        )
        .bind(request.bot_id)
        .bind(request.telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = existing {
            let user = sqlx::query_as::<_, ClientBotUser>(
                r#"
                UPDATE client_bot_users
                SET username = ?, first_name = ?
                WHERE id = ?
                RETURNING id, bot_id, telegram_id, username, first_name, joined_at
                "#,
            )
            .bind(request.username)
            .bind(request.first_name)
            .bind(user.id)
            .fetch_one(&self.pool)
            .await?;

            return Ok((user, false));
        }

        let user = sqlx::query_as::<_, ClientBotUser>(
            r#"
            INSERT INTO client_bot_users (bot_id, telegram_id, username, first_name, joined_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, bot_id, telegram_id, username, first_name, joined_at
            "#,
        )
        .bind(request.bot_id)
        .bind(request.telegram_id)
        .bind(request.username)
        .bind(request.first_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok((user, true))
    }

    /// All recipient identifiers for a client bot broadcast
    pub async fn recipient_ids(&self, bot_id: i64) -> Result<Vec<i64>, RelayBotError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT telegram_id FROM client_bot_users WHERE bot_id = ?")
                .bind(bot_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Count users of one client bot
    pub async fn count(&self, bot_id: i64) -> Result<i64, RelayBotError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM client_bot_users WHERE bot_id = ?")
            .bind(bot_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
