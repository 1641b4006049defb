//! Tunables for the lookup pipeline, deserialised from the `[scrape]` table
//! of the server configuration.

use std::time::Duration;

use serde::Deserialize;

/// Runtime configuration for [`crate::ProfileFetcher`] and
/// [`crate::ImageRelay`]. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
  /// Root of the upstream profile service; handles are appended as a path
  /// segment.
  pub upstream_base_url:    String,
  /// Applied to every outbound request, upstream lookups and relayed images
  /// alike.
  pub request_timeout_secs: u64,
  /// Minimum spacing between two upstream lookups, across all callers.
  pub min_spacing_ms:       u64,
  pub cache_ttl_secs:       u64,
  /// Path of the image relay endpoint, used to build proxied references.
  pub proxy_path:           String,
  /// Largest image body the relay will buffer.
  pub max_image_bytes:      usize,
  /// Let the relay reach loopback, private and link-local addresses. Off
  /// outside tests.
  pub allow_private_hosts:  bool,
}

impl Default for ScrapeConfig {
  fn default() -> Self {
    Self {
      upstream_base_url:    "https://www.instagram.com".to_owned(),
      request_timeout_secs: 10,
      min_spacing_ms:       5_000,
      cache_ttl_secs:       30 * 60,
      proxy_path:           "/api/proxy-image".to_owned(),
      max_image_bytes:      10 * 1024 * 1024,
      allow_private_hosts:  false,
    }
  }
}

impl ScrapeConfig {
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn min_spacing(&self) -> Duration { Duration::from_millis(self.min_spacing_ms) }

  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }
}
