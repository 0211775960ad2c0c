//! Broadcast history repository implementation

use chrono::Utc;
use crate::database::connection::DatabasePool;
use crate::models::broadcast::{BroadcastRecord, BroadcastStats, CreateBroadcastRecord};
use crate::utils::errors::RelayBotError;

#[derive(Debug, Clone)]
pub struct BroadcastRepository {
    pool: DatabasePool,
}

impl BroadcastRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Append one broadcast record to the history
    pub async fn record(&self, request: CreateBroadcastRecord) -> Result<BroadcastRecord, RelayBotError> {
        let record = sqlx::query_as::<_, BroadcastRecord>(
            r#"
            INSERT INTO broadcast_history
                (scope, bot_id, sender_id, message_text, total_count, sent_count, failed_count, sent_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, scope, bot_id, sender_id, message_text, total_count, sent_count, failed_count, sent_at
            "#,
        )
        .bind(request.scope.as_str())
        .bind(request.bot_id)
        .bind(request.sender_id)
        .bind(request.message_text)
        .bind(request.total_count)
        .bind(request.sent_count)
        .bind(request.failed_count)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Most recent broadcasts, newest first
    pub async fn history(&self, limit: i64) -> Result<Vec<BroadcastRecord>, RelayBotError> {
        let records = sqlx::query_as::<_, BroadcastRecord>(
            "SELECT id, scope, bot_id, sender_id, message_text, total_count, sent_count, failed_count, sent_at FROM broadcast_history ORDER BY sent_at DESC, id DESC LIMIT ?"
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Most recent broadcasts issued by one sender
    pub async fn history_for_sender(&self, sender_id: i64, limit: i64) -> Result<Vec<BroadcastRecord>, RelayBotError> {
        let records = sqlx::query_as::<_, BroadcastRecord>(
            "SELECT id, scope, bot_id, sender_id, message_text, total_count, sent_count, failed_count, sent_at FROM broadcast_history WHERE sender_id = ? ORDER BY sent_at DESC, id DESC LIMIT ?"
        )
        .bind(sender_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Aggregate statistics across all broadcasts
    pub async fn stats(&self) -> Result<BroadcastStats, RelayBotError> {
        let stats = sqlx::query_as::<_, BroadcastStats>(
            r#"
            SELECT COUNT(*) AS total_broadcasts,
                   COALESCE(SUM(sent_count), 0) AS total_sent,
                   COALESCE(SUM(failed_count), 0) AS total_failed
            FROM broadcast_history
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
