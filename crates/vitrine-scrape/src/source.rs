//! The `ProfileSource` trait: the pluggable upstream call.

use std::future::Future;

use thiserror::Error;

/// Raw profile fields as reported by an upstream. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamProfile {
  pub full_name:       Option<String>,
  pub biography:       Option<String>,
  pub follower_count:  Option<u64>,
  pub profile_pic_url: Option<String>,
}

/// Why an upstream lookup failed. The fetcher decides which of these it
/// recovers from.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
  #[error("upstream rate limit exceeded")]
  RateLimited,

  #[error("profile not found upstream")]
  NotFound,

  /// DNS, connect and timeout failures.
  #[error("upstream unreachable: {0}")]
  Unreachable(String),

  #[error("upstream responded with status {0}")]
  Status(u16),

  #[error("malformed upstream response: {0}")]
  Malformed(String),
}

/// Abstraction over the external service that knows about handles.
///
/// The returned future must be `Send` so the fetcher can run inside axum
/// handlers on a multi-threaded runtime.
pub trait ProfileSource: Send + Sync {
  /// Look up `handle` (already `@`-stripped, caller casing preserved).
  fn lookup<'a>(
    &'a self,
    handle: &'a str,
  ) -> impl Future<Output = Result<UpstreamProfile, UpstreamError>> + Send + 'a;
}
