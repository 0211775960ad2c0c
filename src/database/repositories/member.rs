//! Member repository implementation

use chrono::Utc;
use crate::database::connection::DatabasePool;
use crate::models::member::{Member, TrackMemberRequest};
use crate::utils::errors::RelayBotError;

#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: DatabasePool,
}

impl MemberRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Record a member on contact. Inserts on first contact, refreshes the
    /// profile fields on repeat contact. Returns the member and whether the
    /// row is new.
    pub async fn track(&self, request: TrackMemberRequest) -> Result<(Member, bool), RelayBotError> {
        if let Some(existing) = self.find_by_telegram_id(request.telegram_id).await? {
            let member = sqlx::query_as::<_, Member>(
                r#"
                UPDATE members
                SET username = ?, first_name = ?, last_name = ?
                WHERE telegram_id = ?
                RETURNING id, telegram_id, username, first_name, last_name, persona, joined_at
                "#,
            )
            .bind(request.username)
            .bind(request.first_name)
            .bind(request.last_name)
            .bind(existing.telegram_id)
            .fetch_one(&self.pool)
            .await?;

            return Ok((member, false));
        }

        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (telegram_id, username, first_name, last_name, joined_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, telegram_id, username, first_name, last_name, persona, joined_at
            "#,
        )
        .bind(request.telegram_id)
        .bind(request.username)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok((member, true))
    }

    /// Find member by Telegram ID
    pub async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<Member>, RelayBotError> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, telegram_id, username, first_name, last_name, persona, joined_at FROM members WHERE telegram_id = ?"
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// All recipient identifiers for a master broadcast
    pub async fn recipient_ids(&self) -> Result<Vec<i64>, RelayBotError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT telegram_id FROM members")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Most recently joined members
    pub async fn recent(&self, limit: i64) -> Result<Vec<Member>, RelayBotError> {
        let members = sqlx::query_as::<_, Member>(
            "SELECT id, telegram_id, username, first_name, last_name, persona, joined_at FROM members ORDER BY joined_at DESC LIMIT ?"
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Count total members
    pub async fn count(&self) -> Result<i64, RelayBotError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Store the persona used by the chat relay for this member
    pub async fn set_persona(&self, telegram_id: i64, persona: &str) -> Result<(), RelayBotError> {
        sqlx::query("UPDATE members SET persona = ? WHERE telegram_id = ?")
            .bind(persona)
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn persona(&self, telegram_id: i64) -> Result<Option<String>, RelayBotError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT persona FROM members WHERE telegram_id = ?")
                .bind(telegram_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(persona,)| persona))
    }
}
