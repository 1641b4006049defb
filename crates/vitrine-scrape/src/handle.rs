//! Handle normalization.
//!
//! Handles are case-insensitive for lookup and may carry a leading `@`. The
//! cleaned form keeps the caller's casing (it is shown back to users); the
//! cache key is the lowercased cleaned form.

use std::fmt;

use crate::FetchError;

/// Longest handle the upstream accepts.
const MAX_HANDLE_LEN: usize = 30;

/// A validated, `@`-stripped handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle(String);

impl Handle {
  /// Strip surrounding whitespace and one leading `@`, then check that what
  /// remains is a plausible account name (ASCII letters, digits, `.` and
  /// `_`).
  pub fn parse(raw: &str) -> Result<Self, FetchError> {
    let clean = strip(raw);
    if clean.is_empty() {
      return Err(FetchError::Validation("handle is required".to_owned()));
    }
    if clean.len() > MAX_HANDLE_LEN {
      return Err(FetchError::Validation(format!(
        "handle is longer than {MAX_HANDLE_LEN} characters"
      )));
    }
    if let Some(bad) = clean
      .chars()
      .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_')))
    {
      return Err(FetchError::Validation(format!(
        "handle contains unsupported character {bad:?}"
      )));
    }
    Ok(Self(clean.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Lowercased form; identical for handles differing only in case.
  pub fn key(&self) -> String { self.0.to_lowercase() }

  /// Upper-cased first character, used for placeholder avatars.
  pub fn initial(&self) -> char {
    self
      .0
      .chars()
      .next()
      .map(|c| c.to_ascii_uppercase())
      .unwrap_or('?')
  }
}

impl fmt::Display for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Cache key for an arbitrary raw handle: trimmed, `@`-stripped, lowercased.
pub fn cache_key(raw: &str) -> String { strip(raw).to_lowercase() }

fn strip(raw: &str) -> &str {
  let raw = raw.trim();
  raw.strip_prefix('@').unwrap_or(raw)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_one_leading_at_and_keeps_case() {
    let h = Handle::parse("  @MariaTest ").unwrap();
    assert_eq!(h.as_str(), "MariaTest");
    assert_eq!(h.key(), "mariatest");
    assert_eq!(h.initial(), 'M');
  }

  #[test]
  fn cache_key_matches_handle_key() {
    assert_eq!(cache_key("@MariaTest"), "mariatest");
    assert_eq!(cache_key("mariatest"), Handle::parse("@MARIATEST").unwrap().key());
  }

  #[test]
  fn rejects_empty_and_malformed_handles() {
    assert!(matches!(Handle::parse(""), Err(FetchError::Validation(_))));
    assert!(matches!(Handle::parse(" @ "), Err(FetchError::Validation(_))));
    assert!(matches!(Handle::parse("a/b"), Err(FetchError::Validation(_))));
    assert!(matches!(Handle::parse("@@double"), Err(FetchError::Validation(_))));
    assert!(matches!(
      Handle::parse(&"x".repeat(31)),
      Err(FetchError::Validation(_))
    ));
  }

  #[test]
  fn accepts_dots_and_underscores() {
    assert_eq!(Handle::parse("mari.v_medeiros").unwrap().as_str(), "mari.v_medeiros");
  }
}
