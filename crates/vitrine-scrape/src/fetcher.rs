//! [`ProfileFetcher`]: cache, gate, upstream and fallback, in that order.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, warn};
use vitrine_core::record::{ProfileRecord, RecordOrigin};

use crate::{
  FetchError,
  cache::ProfileCache,
  config::ScrapeConfig,
  fallback::{GENERIC_BIOGRAPHY, fallback_record, placeholder_image_ref, proxied_image_ref},
  gate::RateGate,
  handle::Handle,
  source::{ProfileSource, UpstreamError, UpstreamProfile},
};

/// Long-lived lookup service. Owns the rate state and the cache; share it
/// behind an `Arc`.
///
/// Concurrent misses for the same handle are collapsed: each handle has an
/// in-flight lock, and whoever acquires it re-checks the cache before going
/// upstream. Only failed lookups let a second caller through.
pub struct ProfileFetcher<P> {
  source:     P,
  gate:       RateGate,
  cache:      ProfileCache,
  proxy_path: String,
  in_flight:  Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<P: ProfileSource> ProfileFetcher<P> {
  pub fn new(source: P, config: &ScrapeConfig) -> Self {
    Self {
      source,
      gate: RateGate::new(config.min_spacing()),
      cache: ProfileCache::new(config.cache_ttl()),
      proxy_path: config.proxy_path.clone(),
      in_flight: Mutex::new(HashMap::new()),
    }
  }

  pub fn cache(&self) -> &ProfileCache { &self.cache }

  pub fn source(&self) -> &P { &self.source }

  /// Graceful lookup: always yields something displayable unless the
  /// upstream explicitly says the profile does not exist or that we are
  /// calling too often. Every other upstream failure is replaced by the
  /// fallback record, which is not cached.
  pub async fn fetch(&self, raw_handle: &str) -> Result<ProfileRecord, FetchError> {
    let handle = Handle::parse(raw_handle)?;
    match self.lookup(&handle).await {
      Ok(record) => Ok(record),
      Err(UpstreamError::RateLimited) => Err(FetchError::RateLimited),
      Err(UpstreamError::NotFound) => Err(FetchError::NotFound(handle.to_string())),
      Err(e) => {
        let record = fallback_record(&handle, &self.proxy_path);
        warn!(
          %handle,
          error = %e,
          origin = ?record.origin,
          "profile source failed, serving fallback data"
        );
        Ok(record)
      }
    }
  }

  /// Fetch-or-throw lookup: the same pipeline without the fallback table.
  pub async fn fetch_strict(
    &self,
    raw_handle: &str,
  ) -> Result<ProfileRecord, FetchError> {
    let handle = Handle::parse(raw_handle)?;
    self.lookup(&handle).await.map_err(|e| match e {
      UpstreamError::RateLimited => FetchError::RateLimited,
      UpstreamError::NotFound => FetchError::NotFound(handle.to_string()),
      UpstreamError::Unreachable(msg) => FetchError::UpstreamUnreachable(msg),
      other => FetchError::BadGateway(other.to_string()),
    })
  }

  /// Cache hit, or one gated upstream call whose success is cached.
  async fn lookup(&self, handle: &Handle) -> Result<ProfileRecord, UpstreamError> {
    if let Some(hit) = self.cache.get(handle.as_str()).await {
      debug!(%handle, "profile cache hit");
      return Ok(hit);
    }

    let key = handle.key();
    let slot = self
      .in_flight
      .lock()
      .await
      .entry(key.clone())
      .or_default()
      .clone();

    let result = {
      let _guard = slot.lock().await;
      match self.cache.get(handle.as_str()).await {
        Some(hit) => {
          debug!(%handle, "profile cache filled by a concurrent lookup");
          Ok(hit)
        }
        None => self.call_upstream(handle).await,
      }
    };

    // Slot references are only cloned and dropped under the map lock, so the
    // count is exact here. Two means the map and us: nobody else is waiting.
    let mut in_flight = self.in_flight.lock().await;
    if Arc::strong_count(&slot) == 2 {
      in_flight.remove(&key);
    }
    drop(slot);
    drop(in_flight);
    result
  }

  async fn call_upstream(&self, handle: &Handle) -> Result<ProfileRecord, UpstreamError> {
    self.gate.acquire().await;
    let upstream = self.source.lookup(handle.as_str()).await?;
    let record = self.normalize(handle, upstream);
    self.cache.put(handle.as_str(), record.clone()).await;
    Ok(record)
  }

  fn normalize(&self, handle: &Handle, upstream: UpstreamProfile) -> ProfileRecord {
    let profile_image_ref = match upstream.profile_pic_url {
      Some(url) => proxied_image_ref(&self.proxy_path, &url),
      None => placeholder_image_ref(handle),
    };
    ProfileRecord {
      display_name: upstream.full_name.unwrap_or_else(|| format!("@{handle}")),
      profile_image_ref,
      biography: upstream
        .biography
        .unwrap_or_else(|| GENERIC_BIOGRAPHY.to_owned()),
      follower_count: upstream.follower_count.unwrap_or(0),
      origin: RecordOrigin::Live,
    }
  }
}
