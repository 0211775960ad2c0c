//! Broadcast models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Which recipient set a broadcast targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastScope {
    /// All master bot members
    Master,
    /// Users of one client bot
    Client,
}

impl BroadcastScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastScope::Master => "master",
            BroadcastScope::Client => "client",
        }
    }
}

/// Persisted summary of one broadcast operation. Append-only;
/// sent_count + failed_count always equals total_count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BroadcastRecord {
    pub id: i64,
    pub scope: String,
    pub bot_id: Option<i64>,
    pub sender_id: i64,
    pub message_text: String,
    pub total_count: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBroadcastRecord {
    pub scope: BroadcastScope,
    pub bot_id: Option<i64>,
    pub sender_id: i64,
    pub message_text: String,
    pub total_count: i64,
    pub sent_count: i64,
    pub failed_count: i64,
}

/// Final tallies of one dispatch, returned to the caller for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
}

impl BroadcastOutcome {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.sent as f64 / self.total as f64) * 100.0
        }
    }
}

/// Aggregate statistics across all persisted broadcasts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BroadcastStats {
    pub total_broadcasts: i64,
    pub total_sent: i64,
    pub total_failed: i64,
}

/// A broadcast awaiting admin confirmation
#[derive(Debug, Clone)]
pub struct PendingBroadcast {
    pub message_text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_empty() {
        let outcome = BroadcastOutcome { total: 0, sent: 0, failed: 0 };
        assert_eq!(outcome.success_rate(), 0.0);
    }

    #[test]
    fn test_success_rate_partial() {
        let outcome = BroadcastOutcome { total: 4, sent: 3, failed: 1 };
        assert_eq!(outcome.success_rate(), 75.0);
    }
}
