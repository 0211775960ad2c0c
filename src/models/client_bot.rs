//! Client bot models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A client bot registration. Created pending, then approved by an admin
/// and enabled/disabled over its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientBot {
    pub id: i64,
    pub token: String,
    pub bot_username: Option<String>,
    pub bot_first_name: Option<String>,
    pub owner_id: i64,
    pub owner_username: Option<String>,
    pub is_approved: bool,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl ClientBot {
    pub fn status(&self) -> &'static str {
        match (self.is_approved, self.is_enabled) {
            (false, _) => "pending approval",
            (true, false) => "approved",
            (true, true) => "enabled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterBotRequest {
    pub token: String,
    pub bot_username: Option<String>,
    pub bot_first_name: Option<String>,
    pub owner_id: i64,
    pub owner_username: Option<String>,
}

/// Aggregate statistics over the client bot registry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientBotStats {
    pub total_bots: i64,
    pub enabled_bots: i64,
    pub pending_approvals: i64,
}

/// A user of one client bot
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientBotUser {
    pub id: i64,
    pub bot_id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackClientUserRequest {
    pub bot_id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let mut bot = ClientBot {
            id: 1,
            token: "t".to_string(),
            bot_username: None,
            bot_first_name: None,
            owner_id: 1,
            owner_username: None,
            is_approved: false,
            is_enabled: false,
            created_at: Utc::now(),
        };
        assert_eq!(bot.status(), "pending approval");
        bot.is_approved = true;
        assert_eq!(bot.status(), "approved");
        bot.is_enabled = true;
        assert_eq!(bot.status(), "enabled");
    }
}
