//! Broadcast service implementation
//!
//! The dispatch loop at the center of the bot: one delivery attempt per
//! recipient, bounded fan-out, per-recipient failure isolation, atomic
//! success/failure tallies, and one persisted history record per broadcast.
//! Also holds the in-memory pending-broadcast store backing the admin
//! confirmation flow.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use chrono::Utc;
use futures::StreamExt;
use tracing::{info, warn};
use crate::config::BroadcastConfig;
use crate::database::repositories::{BroadcastRepository, ClientUserRepository, MemberRepository};
use crate::models::broadcast::{
    BroadcastOutcome, BroadcastRecord, BroadcastScope, BroadcastStats, CreateBroadcastRecord,
    PendingBroadcast,
};
use crate::models::client_bot::ClientBot;
use crate::services::telegram::{BroadcastSender, SendError};
use crate::utils::errors::{RelayBotError, Result};
use crate::utils::logging::log_broadcast_result;

/// Telegram caps message bodies at 4096 characters
pub const MAX_MESSAGE_LEN: usize = 4096;

#[derive(Clone)]
pub struct BroadcastService {
    members: MemberRepository,
    client_users: ClientUserRepository,
    broadcasts: BroadcastRepository,
    config: BroadcastConfig,
    awaiting: Arc<Mutex<HashSet<i64>>>,
    pending: Arc<Mutex<HashMap<i64, PendingBroadcast>>>,
}

impl BroadcastService {
    pub fn new(
        members: MemberRepository,
        client_users: ClientUserRepository,
        broadcasts: BroadcastRepository,
        config: BroadcastConfig,
    ) -> Self {
        Self {
            members,
            client_users,
            broadcasts,
            config,
            awaiting: Arc::new(Mutex::new(HashSet::new())),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Broadcast to every master bot member and persist the outcome
    pub async fn broadcast_to_members(
        &self,
        sender: &dyn BroadcastSender,
        sender_id: i64,
        text: &str,
    ) -> Result<BroadcastOutcome> {
        validate_message(text)?;
        let recipients = self.members.recipient_ids().await?;

        info!(sender_id = sender_id, recipients = recipients.len(), "Starting master broadcast");
        let outcome = self.dispatch(sender, &recipients, text).await?;

        self.broadcasts
            .record(CreateBroadcastRecord {
                scope: BroadcastScope::Master,
                bot_id: None,
                sender_id,
                message_text: text.to_string(),
                total_count: outcome.total as i64,
                sent_count: outcome.sent as i64,
                failed_count: outcome.failed as i64,
            })
            .await?;

        log_broadcast_result(sender_id, outcome.total, outcome.sent, outcome.failed);
        Ok(outcome)
    }

    /// Broadcast to the users of one client bot. Restricted to the bot's
    /// owner or a master admin.
    pub async fn broadcast_for_bot(
        &self,
        sender: &dyn BroadcastSender,
        bot: &ClientBot,
        sender_id: i64,
        is_admin: bool,
        text: &str,
    ) -> Result<BroadcastOutcome> {
        if bot.owner_id != sender_id && !is_admin {
            return Err(RelayBotError::PermissionDenied(format!(
                "user {} does not own client bot {}",
                sender_id, bot.id
            )));
        }

        validate_message(text)?;
        let recipients = self.client_users.recipient_ids(bot.id).await?;

        info!(sender_id = sender_id, bot_id = bot.id, recipients = recipients.len(), "Starting client broadcast");
        let outcome = self.dispatch(sender, &recipients, text).await?;

        self.broadcasts
            .record(CreateBroadcastRecord {
                scope: BroadcastScope::Client,
                bot_id: Some(bot.id),
                sender_id,
                message_text: text.to_string(),
                total_count: outcome.total as i64,
                sent_count: outcome.sent as i64,
                failed_count: outcome.failed as i64,
            })
            .await?;

        log_broadcast_result(sender_id, outcome.total, outcome.sent, outcome.failed);
        Ok(outcome)
    }

    /// Attempt one delivery per recipient with bounded fan-out.
    ///
    /// One recipient's failure never stops the rest; each attempt lands in
    /// exactly one of the two atomic tallies, so sent + failed == total on
    /// every non-aborted dispatch. A fatal provider error flips the abort
    /// flag, skips the remaining attempts and surfaces once to the caller.
    pub async fn dispatch(
        &self,
        sender: &dyn BroadcastSender,
        recipients: &[i64],
        text: &str,
    ) -> Result<BroadcastOutcome> {
        let sent = AtomicU64::new(0);
        let failed = AtomicU64::new(0);
        let aborted = AtomicBool::new(false);
        let fatal: OnceLock<String> = OnceLock::new();
        let per_attempt = Duration::from_secs(self.config.send_timeout_seconds);

        {
            let sent = &sent;
            let failed = &failed;
            let aborted = &aborted;
            let fatal = &fatal;

            futures::stream::iter(recipients.iter().copied())
                .for_each_concurrent(self.config.concurrency, |recipient| async move {
                    if aborted.load(Ordering::SeqCst) {
                        return;
                    }

                    match tokio::time::timeout(per_attempt, sender.send(recipient, text)).await {
                        Ok(Ok(())) => {
                            sent.fetch_add(1, Ordering::SeqCst);
                        }
                        Ok(Err(SendError::Recipient(reason))) => {
                            failed.fetch_add(1, Ordering::SeqCst);
                            warn!(recipient = recipient, reason = %reason, "Delivery failed");
                        }
                        Ok(Err(SendError::Fatal(reason))) => {
                            warn!(recipient = recipient, reason = %reason, "Provider failure, aborting broadcast");
                            let _ = fatal.set(reason);
                            aborted.store(true, Ordering::SeqCst);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::SeqCst);
                            warn!(recipient = recipient, "Delivery timed out");
                        }
                    }
                })
                .await;
        }

        if aborted.load(Ordering::SeqCst) {
            let reason = fatal
                .into_inner()
                .unwrap_or_else(|| "provider unreachable".to_string());
            return Err(RelayBotError::BroadcastAborted(reason));
        }

        Ok(BroadcastOutcome {
            total: recipients.len() as u64,
            sent: sent.into_inner(),
            failed: failed.into_inner(),
        })
    }

    /// Broadcast history, newest first
    pub async fn history(&self, limit: i64) -> Result<Vec<BroadcastRecord>> {
        self.broadcasts.history(limit).await
    }

    /// Aggregate statistics across all broadcasts
    pub async fn stats(&self) -> Result<BroadcastStats> {
        self.broadcasts.stats().await
    }

    // Pending-broadcast confirmation flow. One slot per admin, held
    // in-process; a restart drops unconfirmed broadcasts.

    /// Mark an admin as composing a broadcast
    pub fn begin_composing(&self, admin_id: i64) {
        self.lock_awaiting().insert(admin_id);
    }

    /// Whether the next message from this admin is a broadcast body
    pub fn is_composing(&self, admin_id: i64) -> bool {
        self.lock_awaiting().contains(&admin_id)
    }

    /// Store the composed message for confirmation
    pub fn save_pending(&self, admin_id: i64, message_text: String) {
        self.lock_awaiting().remove(&admin_id);
        self.lock_pending().insert(
            admin_id,
            PendingBroadcast {
                message_text,
                created_at: Utc::now(),
            },
        );
    }

    /// Remove and return the pending broadcast for this admin
    pub fn take_pending(&self, admin_id: i64) -> Option<PendingBroadcast> {
        self.lock_pending().remove(&admin_id)
    }

    /// Drop any composing state or pending broadcast for this admin
    pub fn clear_pending(&self, admin_id: i64) {
        self.lock_awaiting().remove(&admin_id);
        self.lock_pending().remove(&admin_id);
    }

    fn lock_awaiting(&self) -> MutexGuard<'_, HashSet<i64>> {
        self.awaiting.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<i64, PendingBroadcast>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Reject malformed message bodies before any delivery is attempted
pub fn validate_message(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(RelayBotError::InvalidInput(
            "Broadcast message must not be empty".to_string(),
        ));
    }

    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(RelayBotError::InvalidInput(format!(
            "Broadcast message exceeds {} characters",
            MAX_MESSAGE_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::test_pool;
    use crate::models::member::TrackMemberRequest;
    use async_trait::async_trait;

    /// Sender that fails for listed recipients and records every attempt
    struct ScriptedSender {
        fail: HashSet<i64>,
        fatal: HashSet<i64>,
        attempts: Mutex<Vec<i64>>,
    }

    impl ScriptedSender {
        fn ok() -> Self {
            Self::with_failures(&[])
        }

        fn with_failures(fail: &[i64]) -> Self {
            Self {
                fail: fail.iter().copied().collect(),
                fatal: HashSet::new(),
                attempts: Mutex::new(Vec::new()),
            }
        }

        fn with_fatal(fatal: &[i64]) -> Self {
            Self {
                fail: HashSet::new(),
                fatal: fatal.iter().copied().collect(),
                attempts: Mutex::new(Vec::new()),
            }
        }

        fn attempted(&self) -> Vec<i64> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BroadcastSender for ScriptedSender {
        async fn send(&self, recipient: i64, _text: &str) -> std::result::Result<(), SendError> {
            self.attempts.lock().unwrap().push(recipient);
            if self.fatal.contains(&recipient) {
                Err(SendError::Fatal("Unauthorized".to_string()))
            } else if self.fail.contains(&recipient) {
                Err(SendError::Recipient("blocked by user".to_string()))
            } else {
                Ok(())
            }
        }
    }

    async fn service() -> BroadcastService {
        let pool = test_pool().await;
        BroadcastService::new(
            MemberRepository::new(pool.clone()),
            ClientUserRepository::new(pool.clone()),
            BroadcastRepository::new(pool),
            BroadcastConfig {
                concurrency: 4,
                send_timeout_seconds: 5,
            },
        )
    }

    #[tokio::test]
    async fn test_counts_always_sum_to_total() {
        let service = service().await;
        let sender = ScriptedSender::with_failures(&[2, 4]);
        let recipients: Vec<i64> = (1..=10).collect();

        let outcome = service.dispatch(&sender, &recipients, "hi").await.unwrap();
        assert_eq!(outcome.total, 10);
        assert_eq!(outcome.sent, 8);
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.sent + outcome.failed, outcome.total);
    }

    #[tokio::test]
    async fn test_empty_recipient_set() {
        let service = service().await;
        let sender = ScriptedSender::ok();

        let outcome = service.dispatch(&sender, &[], "hi").await.unwrap();
        assert_eq!(outcome, BroadcastOutcome { total: 0, sent: 0, failed: 0 });
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_recipients() {
        let service = service().await;
        let sender = ScriptedSender::with_failures(&[1]);

        let outcome = service.dispatch(&sender, &[1, 2, 3], "hi").await.unwrap();
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.sent, 2);

        let mut attempted = sender.attempted();
        attempted.sort();
        assert_eq!(attempted, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_and_surfaces_once() {
        let service = service().await;
        let sender = ScriptedSender::with_fatal(&[1]);
        let recipients: Vec<i64> = (1..=100).collect();

        let err = service.dispatch(&sender, &recipients, "hi").await.unwrap_err();
        assert!(matches!(err, RelayBotError::BroadcastAborted(_)));
        // Attempts after the abort flag flipped were skipped
        assert!(sender.attempted().len() < recipients.len());
    }

    #[tokio::test]
    async fn test_malformed_message_rejected_before_dispatch() {
        let service = service().await;
        let sender = ScriptedSender::ok();

        let err = service
            .broadcast_to_members(&sender, 1, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayBotError::InvalidInput(_)));
        assert!(sender.attempted().is_empty());

        let oversized = "x".repeat(MAX_MESSAGE_LEN + 1);
        let err = service
            .broadcast_to_members(&sender, 1, &oversized)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayBotError::InvalidInput(_)));
        assert!(sender.attempted().is_empty());
    }

    #[tokio::test]
    async fn test_master_broadcast_persists_record() {
        let service = service().await;
        for id in [10, 11, 12] {
            service
                .members
                .track(TrackMemberRequest {
                    telegram_id: id,
                    username: None,
                    first_name: None,
                    last_name: None,
                })
                .await
                .unwrap();
        }

        let sender = ScriptedSender::with_failures(&[11]);
        let outcome = service.broadcast_to_members(&sender, 1, "hello").await.unwrap();
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.sent, 2);
        assert_eq!(outcome.failed, 1);

        let history = service.history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_count, 3);
        assert_eq!(history[0].sent_count + history[0].failed_count, history[0].total_count);
    }

    #[tokio::test]
    async fn test_empty_member_set_persists_zero_record() {
        let service = service().await;
        let sender = ScriptedSender::ok();

        let outcome = service.broadcast_to_members(&sender, 1, "hello").await.unwrap();
        assert_eq!(outcome, BroadcastOutcome { total: 0, sent: 0, failed: 0 });

        let history = service.history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_count, 0);
        assert_eq!(history[0].sent_count, 0);
        assert_eq!(history[0].failed_count, 0);
    }

    #[tokio::test]
    async fn test_aborted_broadcast_persists_nothing() {
        let service = service().await;
        service
            .members
            .track(TrackMemberRequest {
                telegram_id: 10,
                username: None,
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();

        let sender = ScriptedSender::with_fatal(&[10]);
        assert!(service.broadcast_to_members(&sender, 1, "hello").await.is_err());
        assert!(service.history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_flow() {
        let service = service().await;

        assert!(!service.is_composing(1));
        service.begin_composing(1);
        assert!(service.is_composing(1));

        service.save_pending(1, "hello".to_string());
        assert!(!service.is_composing(1));

        let pending = service.take_pending(1).unwrap();
        assert_eq!(pending.message_text, "hello");
        assert!(service.take_pending(1).is_none());
    }
}
