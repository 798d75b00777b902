use chainborn_cache::{cache_file_name, CacheConfig, ValidationCache, DEFAULT_MAX_ENTRIES};
use chainborn_types::ValidationResult;
use chrono::{Duration, Utc};
use proptest::prelude::*;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

fn make_result(key: &str) -> ValidationResult {
    ValidationResult::valid(Utc::now() + Duration::minutes(10), key)
}

async fn open_cache(dir: &TempDir, max_entries: usize) -> ValidationCache {
    ValidationCache::open(CacheConfig::new(dir.path()).with_max_entries(max_entries)).await
}

// ── Basic operations ─────────────────────────────────────────────

#[tokio::test]
async fn set_then_get_returns_result() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;

    let result = make_result("k1");
    cache.set("k1", &result, Duration::minutes(5)).await;

    assert_eq!(cache.get("k1").await, Some(result));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn get_absent_key_misses() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;
    assert_eq!(cache.get("nope").await, None);
}

#[tokio::test]
async fn invalidate_then_get_misses() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;

    cache.set("k1", &make_result("k1"), Duration::minutes(5)).await;
    cache.invalidate("k1").await;

    assert_eq!(cache.get("k1").await, None);
    assert!(cache.is_empty());
    assert!(!dir.path().join(cache_file_name("k1")).exists());
}

#[tokio::test]
async fn update_replaces_result() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;

    cache.set("k1", &make_result("first"), Duration::minutes(5)).await;
    let second = make_result("second");
    cache.set("k1", &second, Duration::minutes(5)).await;

    assert_eq!(cache.get("k1").await, Some(second));
    assert_eq!(cache.len(), 1);
}

// ── Expiry ───────────────────────────────────────────────────────

#[tokio::test]
async fn expired_entry_misses_and_is_deleted() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;

    cache.set("k1", &make_result("k1"), Duration::milliseconds(30)).await;
    tokio::time::sleep(StdDuration::from_millis(60)).await;

    assert_eq!(cache.get("k1").await, None);
    assert!(!dir.path().join(cache_file_name("k1")).exists());
}

#[tokio::test]
async fn nonpositive_ttl_is_not_stored() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;

    cache.set("k1", &make_result("k1"), Duration::seconds(-1)).await;
    assert!(cache.is_empty());
}

// ── Reload on start ──────────────────────────────────────────────

#[tokio::test]
async fn entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let result = make_result("k1");
    {
        let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;
        cache.set("k1", &result, Duration::minutes(5)).await;
    }

    let reopened = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.get("k1").await, Some(result));
}

#[tokio::test]
async fn reopen_drops_expired_entries() {
    let dir = TempDir::new().unwrap();
    {
        let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;
        cache.set("k1", &make_result("k1"), Duration::milliseconds(30)).await;
    }
    tokio::time::sleep(StdDuration::from_millis(60)).await;

    let reopened = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;
    assert!(reopened.is_empty());
    assert!(!dir.path().join(cache_file_name("k1")).exists());
}

#[tokio::test]
async fn reopen_removes_stray_tmp_files() {
    let dir = TempDir::new().unwrap();
    let stray = dir.path().join(format!("{}.tmp", cache_file_name("k1")));
    std::fs::write(&stray, "partial write").unwrap();

    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;
    assert!(cache.is_empty());
    assert!(!stray.exists());
}

#[tokio::test]
async fn reopen_drops_corrupt_entries() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(cache_file_name("k1")), "{ not json").unwrap();

    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;
    assert!(cache.is_empty());
    assert!(!dir.path().join(cache_file_name("k1")).exists());
}

// ── Corruption at read time ──────────────────────────────────────

#[tokio::test]
async fn corrupt_entry_discovered_at_read_is_deleted() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, DEFAULT_MAX_ENTRIES).await;

    cache.set("k1", &make_result("k1"), Duration::minutes(5)).await;
    let path = dir.path().join(cache_file_name("k1"));
    std::fs::write(&path, "garbage").unwrap();

    assert_eq!(cache.get("k1").await, None);
    assert!(!path.exists());
    assert!(cache.is_empty());
}

// ── Eviction ─────────────────────────────────────────────────────

#[tokio::test]
async fn insert_at_capacity_evicts_least_recently_accessed() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, 3).await;

    for key in ["a", "b", "c"] {
        cache.set(key, &make_result(key), Duration::minutes(5)).await;
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }

    // Touch "a" so "b" becomes the LRU entry.
    cache.get("a").await.unwrap();
    tokio::time::sleep(StdDuration::from_millis(5)).await;

    cache.set("d", &make_result("d"), Duration::minutes(5)).await;

    assert_eq!(cache.len(), 3);
    assert!(cache.get("a").await.is_some());
    assert_eq!(cache.get("b").await, None);
    assert!(cache.get("c").await.is_some());
    assert!(cache.get("d").await.is_some());
    assert!(!dir.path().join(cache_file_name("b")).exists());
}

#[tokio::test]
async fn update_at_capacity_does_not_evict() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, 2).await;

    cache.set("a", &make_result("a"), Duration::minutes(5)).await;
    cache.set("b", &make_result("b"), Duration::minutes(5)).await;
    cache.set("a", &make_result("a2"), Duration::minutes(5)).await;

    assert_eq!(cache.len(), 2);
    assert!(cache.get("a").await.is_some());
    assert!(cache.get("b").await.is_some());
}

#[tokio::test]
async fn size_never_exceeds_capacity() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, 5).await;

    for i in 0..20 {
        let key = format!("key-{i}");
        cache.set(&key, &make_result(&key), Duration::minutes(5)).await;
        assert!(cache.len() <= 5);
    }
    assert_eq!(cache.len(), 5);
}

// ── Degraded mode ────────────────────────────────────────────────

#[tokio::test]
async fn unusable_directory_disables_cache() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, "file in the way").unwrap();

    let cache = ValidationCache::open(CacheConfig::new(&blocker)).await;
    assert!(!cache.is_enabled());

    cache.set("k1", &make_result("k1"), Duration::minutes(5)).await;
    assert_eq!(cache.get("k1").await, None);
    cache.invalidate("k1").await;
    assert!(cache.is_empty());
}

// ── File naming ──────────────────────────────────────────────────

#[test]
fn file_name_known_vector() {
    // sha256("abc")
    assert_eq!(
        cache_file_name("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.json"
    );
}

proptest! {
    #[test]
    fn file_name_is_sha256_hex(key in ".*") {
        let name = cache_file_name(&key);
        let stem = name.strip_suffix(".json").unwrap();
        prop_assert_eq!(stem.len(), 64);
        prop_assert!(stem.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        // deterministic
        prop_assert_eq!(name.clone(), cache_file_name(&key));
    }
}
