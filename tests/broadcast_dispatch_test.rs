//! Integration tests for the broadcast dispatch pipeline
//!
//! Exercises the public API end to end against an in-memory database:
//! tally conservation under heavy concurrency, the fan-out bound,
//! fatal aborts, per-attempt timeouts and broadcast permissions.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use relaybot::config::{BroadcastConfig, DatabaseConfig};
use relaybot::database::{create_pool, init_schema, DatabasePool};
use relaybot::database::repositories::{
    BroadcastRepository, ClientBotRepository, ClientUserRepository, MemberRepository,
};
use relaybot::models::broadcast::BroadcastScope;
use relaybot::models::client_bot::RegisterBotRequest;
use relaybot::models::member::TrackMemberRequest;
use relaybot::services::broadcast::BroadcastService;
use relaybot::services::telegram::{BroadcastSender, SendError};
use relaybot::RelayBotError;

async fn memory_pool() -> DatabasePool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let pool = create_pool(&config).await.expect("in-memory pool");
    init_schema(&pool).await.expect("schema init");
    pool
}

fn service(pool: &DatabasePool, concurrency: usize, send_timeout_seconds: u64) -> BroadcastService {
    BroadcastService::new(
        MemberRepository::new(pool.clone()),
        ClientUserRepository::new(pool.clone()),
        BroadcastRepository::new(pool.clone()),
        BroadcastConfig {
            concurrency,
            send_timeout_seconds,
        },
    )
}

async fn seed_members(pool: &DatabasePool, count: i64) {
    let members = MemberRepository::new(pool.clone());
    for i in 0..count {
        members
            .track(TrackMemberRequest {
                telegram_id: 1_000 + i,
                username: Some(format!("user{}", i)),
                first_name: Some(format!("User {}", i)),
                last_name: None,
            })
            .await
            .expect("seed member");
    }
}

/// Sender with randomized latency that fails a fixed set of recipients
struct FlakySender {
    failing: HashSet<i64>,
}

#[async_trait]
impl BroadcastSender for FlakySender {
    async fn send(&self, recipient: i64, _text: &str) -> Result<(), SendError> {
        let delay = rand::thread_rng().gen_range(0..5);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if self.failing.contains(&recipient) {
            Err(SendError::Recipient("blocked by recipient".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Sender that records the highest number of concurrent in-flight attempts
struct GaugingSender {
    in_flight: AtomicUsize,
    max_seen: AtomicUsize,
}

impl GaugingSender {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BroadcastSender for GaugingSender {
    async fn send(&self, _recipient: i64, _text: &str) -> Result<(), SendError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sender that turns one recipient into a provider-level failure
struct FatalSender {
    fatal_recipient: i64,
    attempts: AtomicUsize,
}

#[async_trait]
impl BroadcastSender for FatalSender {
    async fn send(&self, recipient: i64, _text: &str) -> Result<(), SendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if recipient == self.fatal_recipient {
            Err(SendError::Fatal("Unauthorized".to_string()))
        } else {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(())
        }
    }
}

/// Sender that hangs for selected recipients
struct SlowSender {
    slow: HashSet<i64>,
}

#[async_trait]
impl BroadcastSender for SlowSender {
    async fn send(&self, recipient: i64, _text: &str) -> Result<(), SendError> {
        if self.slow.contains(&recipient) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Ok(())
    }
}

#[tokio::test]
async fn thousand_recipients_tallies_are_conserved() {
    let pool = memory_pool().await;
    let service = service(&pool, 32, 10);

    let recipients: Vec<i64> = (0..1_000).collect();
    let failing: HashSet<i64> = recipients.iter().copied().filter(|r| r % 7 == 0).collect();
    let expected_failures = failing.len() as u64;

    let sender = FlakySender { failing };
    let outcome = service
        .dispatch(&sender, &recipients, "hello everyone")
        .await
        .expect("dispatch");

    assert_eq!(outcome.total, 1_000);
    assert_eq!(outcome.failed, expected_failures);
    assert_eq!(outcome.sent, 1_000 - expected_failures);
    assert_eq!(outcome.sent + outcome.failed, outcome.total);
}

#[tokio::test]
async fn fan_out_never_exceeds_the_configured_limit() {
    let pool = memory_pool().await;
    let service = service(&pool, 8, 10);

    let recipients: Vec<i64> = (0..200).collect();
    let sender = GaugingSender::new();

    let outcome = service
        .dispatch(&sender, &recipients, "ping")
        .await
        .expect("dispatch");

    assert_eq!(outcome.sent, 200);
    let max_seen = sender.max_seen.load(Ordering::SeqCst);
    assert!(max_seen <= 8, "saw {} concurrent attempts", max_seen);
    assert!(max_seen > 1, "fan-out never overlapped");
}

#[tokio::test]
async fn fatal_provider_error_aborts_and_persists_nothing() {
    let pool = memory_pool().await;
    let service = service(&pool, 4, 10);
    seed_members(&pool, 50).await;

    let sender = FatalSender {
        fatal_recipient: 1_000,
        attempts: AtomicUsize::new(0),
    };

    let result = service.broadcast_to_members(&sender, 42, "announcement").await;
    match result {
        Err(RelayBotError::BroadcastAborted(reason)) => {
            assert!(reason.contains("Unauthorized"));
        }
        other => panic!("expected aborted broadcast, got {:?}", other.map(|o| o.total)),
    }

    let history = service.history(10).await.expect("history");
    assert!(history.is_empty(), "aborted broadcast must not be recorded");
}

#[tokio::test]
async fn timed_out_attempts_count_as_failures() {
    let pool = memory_pool().await;
    let service = service(&pool, 16, 1);

    let recipients: Vec<i64> = (0..10).collect();
    let slow: HashSet<i64> = [3, 7].into_iter().collect();

    let sender = SlowSender { slow };
    let outcome = service
        .dispatch(&sender, &recipients, "ping")
        .await
        .expect("dispatch");

    assert_eq!(outcome.total, 10);
    assert_eq!(outcome.failed, 2);
    assert_eq!(outcome.sent, 8);
}

#[tokio::test]
async fn member_broadcast_persists_one_record() {
    let pool = memory_pool().await;
    let service = service(&pool, 8, 10);
    seed_members(&pool, 25).await;

    let sender = FlakySender {
        failing: [1_003, 1_017].into_iter().collect(),
    };

    let outcome = service
        .broadcast_to_members(&sender, 42, "release notes")
        .await
        .expect("broadcast");

    assert_eq!(outcome.total, 25);
    assert_eq!(outcome.failed, 2);

    let history = service.history(10).await.expect("history");
    assert_eq!(history.len(), 1);
    let record = &history[0];
    assert_eq!(record.scope, BroadcastScope::Master.as_str());
    assert_eq!(record.bot_id, None);
    assert_eq!(record.sender_id, 42);
    assert_eq!(record.message_text, "release notes");
    assert_eq!(record.total_count, 25);
    assert_eq!(record.sent_count, 23);
    assert_eq!(record.failed_count, 2);
}

#[tokio::test]
async fn empty_member_set_records_a_zero_broadcast() {
    let pool = memory_pool().await;
    let service = service(&pool, 8, 10);

    let sender = FlakySender { failing: HashSet::new() };
    let outcome = service
        .broadcast_to_members(&sender, 42, "anyone there?")
        .await
        .expect("broadcast");

    assert_eq!(outcome.total, 0);
    assert_eq!(outcome.sent, 0);
    assert_eq!(outcome.failed, 0);

    let history = service.history(10).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].total_count, 0);
}

#[tokio::test]
async fn client_broadcast_requires_ownership() {
    let pool = memory_pool().await;
    let service = service(&pool, 8, 10);

    let bots = ClientBotRepository::new(pool.clone());
    let registered = bots
        .create(RegisterBotRequest {
            token: "12345:test-token".to_string(),
            bot_username: Some("relay_client_bot".to_string()),
            bot_first_name: Some("Relay Client".to_string()),
            owner_id: 7,
            owner_username: Some("owner".to_string()),
        })
        .await
        .expect("register bot");

    let sender = FlakySender { failing: HashSet::new() };

    // A stranger without admin rights is refused
    let result = service
        .broadcast_for_bot(&sender, &registered, 99, false, "hi")
        .await;
    assert!(matches!(result, Err(RelayBotError::PermissionDenied(_))));
    assert!(service.history(10).await.expect("history").is_empty());

    // The owner goes through
    let outcome = service
        .broadcast_for_bot(&sender, &registered, 7, false, "hi")
        .await
        .expect("owner broadcast");
    assert_eq!(outcome.total, 0);

    // So does an admin who is not the owner
    let outcome = service
        .broadcast_for_bot(&sender, &registered, 99, true, "hi again")
        .await
        .expect("admin broadcast");
    assert_eq!(outcome.total, 0);

    let history = service.history(10).await.expect("history");
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|r| r.scope == BroadcastScope::Client.as_str()));
    assert!(history.iter().all(|r| r.bot_id == Some(registered.id)));
}

#[tokio::test]
async fn malformed_bodies_are_rejected_before_any_send() {
    let pool = memory_pool().await;
    let service = service(&pool, 8, 10);
    seed_members(&pool, 5).await;

    let attempts = Mutex::new(Vec::new());

    struct RecordingSender<'a> {
        attempts: &'a Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl BroadcastSender for RecordingSender<'_> {
        async fn send(&self, recipient: i64, _text: &str) -> Result<(), SendError> {
            self.attempts.lock().unwrap().push(recipient);
            Ok(())
        }
    }

    let sender = RecordingSender { attempts: &attempts };

    let result = service.broadcast_to_members(&sender, 42, "   ").await;
    assert!(matches!(result, Err(RelayBotError::InvalidInput(_))));

    let oversized = "x".repeat(5_000);
    let result = service.broadcast_to_members(&sender, 42, &oversized).await;
    assert!(matches!(result, Err(RelayBotError::InvalidInput(_))));

    assert!(attempts.lock().unwrap().is_empty(), "no delivery may be attempted");
    assert!(service.history(10).await.expect("history").is_empty());
}
