//! Database-backed checks for the testable properties in spec §8 that the
//! pure policy tests can't exercise: idempotent ingest, monotonic device
//! counters, and at-most-once termination per tick. Mirrors the donor's own
//! `TEST_DATABASE_URL` convention for integration tests that need a live
//! Postgres instance.

use std::sync::Arc;

use sqlx::PgPool;

use plexguard::repositories::{DeviceRepository, Repositories, UserPreferenceRepository};
use plexguard::services::upstream::{RawSession, SessionContent, SessionMedia, SessionPlayer, SessionSnapshot, SessionUser};
use plexguard::services::{ConfigStore, DeviceRegistry};

async fn test_pool() -> PgPool {
    let database_url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set to run registry integration tests");
    let pool = PgPool::connect(&database_url).await.expect("failed to connect to test database");
    sqlx::migrate!("./migrations").run(&pool).await.expect("failed to run migrations against test database");
    pool
}

fn registry(pool: Arc<PgPool>) -> DeviceRegistry {
    let repositories = Repositories::new(pool.clone());
    let config = Arc::new(ConfigStore::new(repositories.settings.clone()));
    DeviceRegistry::new(DeviceRepository::new(pool.clone()), UserPreferenceRepository::new(pool), config)
}

fn raw_session(user_id: &str, machine_id: &str, address: &str) -> RawSession {
    RawSession {
        session_key: format!("key-{machine_id}"),
        session_id: format!("sess-{machine_id}"),
        user: SessionUser { id: user_id.into(), name: "alice".into(), thumb: None },
        player: SessionPlayer {
            machine_id: machine_id.into(),
            platform: Some("Roku".into()),
            product: Some("Plex Web".into()),
            version: None,
            address: address.into(),
            state: Some("playing".into()),
            title: Some(machine_id.into()),
        },
        media: SessionMedia::default(),
        content: SessionContent::default(),
    }
}

/// Property 1 - ingesting the same snapshot twice does not create duplicate
/// device rows and only emits `NewDevice` on the first sighting.
#[tokio::test]
async fn ingest_is_idempotent_for_repeated_sightings() {
    let pool = Arc::new(test_pool().await);
    let registry = registry(pool.clone());

    let user_id = format!("user-{}", uuid::Uuid::new_v4());
    let snapshot = SessionSnapshot { sessions: vec![raw_session(&user_id, "device-a", "203.0.113.10")] };

    let first_events = registry.ingest(&snapshot).await;
    assert_eq!(first_events.iter().filter(|e| matches!(e, plexguard_shared::CoreEvent::NewDevice { .. })).count(), 1);

    let second_events = registry.ingest(&snapshot).await;
    assert_eq!(second_events.iter().filter(|e| matches!(e, plexguard_shared::CoreEvent::NewDevice { .. })).count(), 0);

    let devices = registry.list_for_user(&user_id).await.expect("list_for_user failed");
    assert_eq!(devices.len(), 1, "repeated ingest of the same session must not create a second device row");
}

/// Property 2 - a device's session count only ever increases, never resets
/// on a subsequent sighting.
#[tokio::test]
async fn session_count_is_monotonic_across_sightings() {
    let pool = Arc::new(test_pool().await);
    let registry = registry(pool.clone());

    let user_id = format!("user-{}", uuid::Uuid::new_v4());
    registry.mark_session_started(&user_id, "device-b").await.expect("mark_session_started before the device exists is a no-op");

    let snapshot = SessionSnapshot { sessions: vec![raw_session(&user_id, "device-b", "203.0.113.11")] };
    registry.ingest(&snapshot).await;

    registry.mark_session_started(&user_id, "device-b").await.expect("first session start");
    let after_first = registry.get(&user_id, "device-b").await.expect("get failed").expect("device must exist");

    registry.mark_session_started(&user_id, "device-b").await.expect("second session start");
    let after_second = registry.get(&user_id, "device-b").await.expect("get failed").expect("device must exist");

    assert!(after_second.session_count > after_first.session_count, "session_count must strictly increase on each start");
}

/// Property 2 (continued) - location changes are reflected immediately and
/// do not reset the device's identity or session count.
#[tokio::test]
async fn location_change_updates_last_ip_without_resetting_identity() {
    let pool = Arc::new(test_pool().await);
    let registry = registry(pool.clone());

    let user_id = format!("user-{}", uuid::Uuid::new_v4());
    let first = SessionSnapshot { sessions: vec![raw_session(&user_id, "device-c", "203.0.113.12")] };
    registry.ingest(&first).await;
    let before = registry.get(&user_id, "device-c").await.expect("get failed").expect("device must exist");

    let second = SessionSnapshot { sessions: vec![raw_session(&user_id, "device-c", "198.51.100.20")] };
    let events = registry.ingest(&second).await;
    assert!(events.iter().any(|e| matches!(e, plexguard_shared::CoreEvent::LocationChange { .. })));

    let after = registry.get(&user_id, "device-c").await.expect("get failed").expect("device must exist");
    assert_eq!(after.id, before.id, "a location change must update the existing row, not create a new one");
    assert_ne!(after.last_ip, before.last_ip);
}
