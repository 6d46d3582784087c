//! Secrets cache tests

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use satgent::cache::secrets::SecretsCache;

use common::{make_secret, MockPlatform};

#[tokio::test]
async fn test_miss_triggers_exactly_one_fetch() {
    let platform = Arc::new(MockPlatform::new());
    let secret_id = Uuid::new_v4();
    platform.insert_secret(make_secret(secret_id, "db_password", "hunter2"));

    let cache = SecretsCache::new(platform.clone(), Duration::from_secs(900));

    let secret = cache.get_secret(secret_id).await.unwrap();
    assert_eq!(secret.expose(), "hunter2");
    assert_eq!(platform.single_secret_fetches.load(Ordering::SeqCst), 1);

    // Second read is served from the cache
    cache.get_secret(secret_id).await.unwrap();
    assert_eq!(platform.single_secret_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let platform = Arc::new(MockPlatform::new());
    platform.insert_secret(make_secret(Uuid::new_v4(), "a", "1"));

    let cache = SecretsCache::new(platform.clone(), Duration::from_secs(900));
    cache.initialize().await.unwrap();
    cache.initialize().await.unwrap();

    assert_eq!(platform.bulk_secret_fetches.load(Ordering::SeqCst), 1);
    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_bulk_fill_serves_reads_without_single_fetches() {
    let platform = Arc::new(MockPlatform::new());
    let secret_id = Uuid::new_v4();
    platform.insert_secret(make_secret(secret_id, "api_token", "tok-123"));

    let cache = SecretsCache::new(platform.clone(), Duration::from_secs(900));
    cache.initialize().await.unwrap();

    let secret = cache.get_secret(secret_id).await.unwrap();
    assert_eq!(secret.expose(), "tok-123");
    assert_eq!(platform.single_secret_fetches.load(Ordering::SeqCst), 0);
    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_remote_failure_resolves_to_none() {
    let platform = Arc::new(MockPlatform::new());
    platform.fail_secret_fetches.store(true, Ordering::SeqCst);

    let cache = SecretsCache::new(platform.clone(), Duration::from_secs(900));
    assert!(cache.get_secret(Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn test_failed_initial_fill_recovers_on_demand() {
    let platform = Arc::new(MockPlatform::new());
    let secret_id = Uuid::new_v4();
    platform.insert_secret(make_secret(secret_id, "late", "value"));
    platform.fail_secret_fetches.store(true, Ordering::SeqCst);

    let cache = SecretsCache::new(platform.clone(), Duration::from_secs(900));
    // Bulk fill fails, initialize still succeeds
    cache.initialize().await.unwrap();

    // Platform comes back; the miss is filled on demand
    platform.fail_secret_fetches.store(false, Ordering::SeqCst);
    let secret = cache.get_secret(secret_id).await.unwrap();
    assert_eq!(secret.expose(), "value");
    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_refresh_loop_picks_up_new_secrets() {
    let platform = Arc::new(MockPlatform::new());
    let cache = SecretsCache::new(platform.clone(), Duration::from_millis(20));
    cache.initialize().await.unwrap();

    // Secret appears after the initial fill; the refresh loop fetches it
    let secret_id = Uuid::new_v4();
    platform.insert_secret(make_secret(secret_id, "rotated", "v2"));
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(platform.bulk_secret_fetches.load(Ordering::SeqCst) >= 2);
    let secret = cache.get_secret(secret_id).await.unwrap();
    assert_eq!(secret.expose(), "v2");
    assert_eq!(platform.single_secret_fetches.load(Ordering::SeqCst), 0);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_refresh_task() {
    let platform = Arc::new(MockPlatform::new());
    let cache = SecretsCache::new(platform.clone(), Duration::from_millis(10));
    cache.initialize().await.unwrap();
    cache.shutdown().await.unwrap();

    let fetches = platform.bulk_secret_fetches.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(platform.bulk_secret_fetches.load(Ordering::SeqCst), fetches);

    // A second shutdown is a no-op
    cache.shutdown().await.unwrap();
}
