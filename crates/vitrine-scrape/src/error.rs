//! Error types surfaced by the lookup pipeline and the image relay.

use thiserror::Error;

/// A failed profile lookup, as seen by callers of
/// [`crate::ProfileFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("invalid handle: {0}")]
  Validation(String),

  #[error("profile @{0} not found")]
  NotFound(String),

  #[error("too many requests to the profile source; try again in a few minutes")]
  RateLimited,

  #[error("profile source unreachable: {0}")]
  UpstreamUnreachable(String),

  #[error("profile source failed: {0}")]
  BadGateway(String),
}

/// A failed image relay. The relay never substitutes data, so every failure
/// reaches the client.
#[derive(Debug, Error)]
pub enum RelayError {
  #[error("invalid image url: {0}")]
  Validation(String),

  #[error("image not found upstream")]
  NotFound,

  #[error("image host is rate limiting requests")]
  TooManyRequests,

  #[error("failed to load image: {0}")]
  BadGateway(String),
}
