//! The normalized result of an external profile lookup.

use serde::{Deserialize, Serialize};

/// Where a [`ProfileRecord`]'s data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
  /// Fetched from the upstream (possibly served from cache since).
  #[default]
  Live,
  /// Substituted from the built-in table of known handles.
  KnownFallback,
  /// Synthesized for an unknown handle after an upstream failure.
  Placeholder,
}

impl RecordOrigin {
  pub fn is_fallback(self) -> bool { !matches!(self, Self::Live) }
}

/// A fully-populated profile payload. Never partially constructed: defaults
/// fill in whatever the upstream omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
  pub display_name:      String,
  /// Either a proxied-image reference or a placeholder URL.
  pub profile_image_ref: String,
  pub biography:         String,
  pub follower_count:    u64,
  #[serde(default)]
  pub origin:            RecordOrigin,
}
