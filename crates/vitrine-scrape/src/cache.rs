//! [`ProfileCache`]: time-bounded memoization of lookups.
//!
//! Entries are never purged: a stale entry is simply reported as a miss and
//! overwritten by the next successful lookup for the same handle. Memory
//! therefore grows with the number of distinct handles ever looked up.

use std::{collections::HashMap, time::Duration};

use tokio::{sync::Mutex, time::Instant};
use vitrine_core::record::ProfileRecord;

use crate::handle::cache_key;

#[derive(Debug)]
struct CacheEntry {
  value:      ProfileRecord,
  fetched_at: Instant,
}

/// Lookup results keyed by normalized handle, valid for `ttl`.
#[derive(Debug)]
pub struct ProfileCache {
  ttl:     Duration,
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ProfileCache {
  pub fn new(ttl: Duration) -> Self {
    Self { ttl, entries: Mutex::new(HashMap::new()) }
  }

  /// The cached record for `handle` if it was stored less than `ttl` ago.
  pub async fn get(&self, handle: &str) -> Option<ProfileRecord> {
    let entries = self.entries.lock().await;
    entries
      .get(&cache_key(handle))
      .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
      .map(|entry| entry.value.clone())
  }

  /// Insert or overwrite the entry for `handle`, stamped now.
  pub async fn put(&self, handle: &str, value: ProfileRecord) {
    let entry = CacheEntry { value, fetched_at: Instant::now() };
    self.entries.lock().await.insert(cache_key(handle), entry);
  }

  /// Number of stored entries, stale ones included.
  pub async fn len(&self) -> usize { self.entries.lock().await.len() }

  pub async fn is_empty(&self) -> bool { self.len().await == 0 }
}

#[cfg(test)]
mod tests {
  use vitrine_core::record::RecordOrigin;

  use super::*;

  const TTL: Duration = Duration::from_secs(30 * 60);

  fn record(name: &str) -> ProfileRecord {
    ProfileRecord {
      display_name:      name.into(),
      profile_image_ref: "https://example.com/a.jpg".into(),
      biography:         "bio".into(),
      follower_count:    10,
      origin:            RecordOrigin::Live,
    }
  }

  #[tokio::test(start_paused = true)]
  async fn get_within_ttl_is_stable() {
    let cache = ProfileCache::new(TTL);
    cache.put("bianca", record("Bianca")).await;

    let first = cache.get("bianca").await;
    tokio::time::advance(Duration::from_secs(60)).await;
    let second = cache.get("bianca").await;

    assert_eq!(first, Some(record("Bianca")));
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn keys_are_normalized() {
    let cache = ProfileCache::new(TTL);
    cache.put("@Bianca", record("Bianca")).await;
    assert!(cache.get("bianca").await.is_some());
    assert!(cache.get("@BIANCA").await.is_some());
    assert_eq!(cache.len().await, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn stale_entries_read_as_misses_but_are_kept() {
    let cache = ProfileCache::new(TTL);
    cache.put("bianca", record("Bianca")).await;
    tokio::time::advance(TTL).await;

    assert_eq!(cache.get("bianca").await, None);
    assert_eq!(cache.len().await, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn put_refreshes_the_timestamp() {
    let cache = ProfileCache::new(TTL);
    cache.put("bianca", record("Old")).await;
    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    cache.put("bianca", record("New")).await;
    tokio::time::advance(Duration::from_secs(2)).await;

    assert_eq!(cache.get("bianca").await, Some(record("New")));
  }

  #[tokio::test]
  async fn miss_for_unknown_handle() {
    let cache = ProfileCache::new(TTL);
    assert!(cache.is_empty().await);
    assert_eq!(cache.get("nobody").await, None);
  }
}
