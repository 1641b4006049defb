//! Tags: user-defined categories attached to profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, profile::Profile};

/// Color given to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#6366f1";

/// A category. `name` is unique and compared case-sensitively by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id:     Uuid,
  pub name:       String,
  /// CSS hex color, e.g. `#ec4899`.
  pub color:      String,
  pub created_at: DateTime<Utc>,
}

/// A tag with the number of profiles carrying it; the list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSummary {
  #[serde(flatten)]
  pub tag:           Tag,
  pub profile_count: u64,
}

/// A tag with every profile carrying it; the detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagDetail {
  #[serde(flatten)]
  pub tag:      Tag,
  pub profiles: Vec<Profile>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CatalogStore::create_tag`].
#[derive(Debug, Clone)]
pub struct NewTag {
  pub name:  String,
  pub color: String,
}

impl NewTag {
  /// Validate caller input; a missing color falls back to
  /// [`DEFAULT_TAG_COLOR`].
  pub fn new(name: &str, color: Option<&str>) -> Result<Self> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::MissingTagName);
    }
    let color = match color.map(str::trim).filter(|c| !c.is_empty()) {
      Some(c) => validate_color(c)?,
      None => DEFAULT_TAG_COLOR.to_owned(),
    };
    Ok(Self { name: name.to_owned(), color })
  }
}

/// Partial update for a tag. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TagPatch {
  pub name:  Option<String>,
  pub color: Option<String>,
}

impl TagPatch {
  pub fn new(name: Option<&str>, color: Option<&str>) -> Result<Self> {
    let name = match name.map(str::trim) {
      Some("") => return Err(Error::MissingTagName),
      other => other.map(str::to_owned),
    };
    let color = color.map(validate_color).transpose()?;
    Ok(Self { name, color })
  }
}

fn validate_color(color: &str) -> Result<String> {
  let color = color.trim();
  let valid = color
    .strip_prefix('#')
    .filter(|hex| matches!(hex.len(), 3 | 6))
    .is_some_and(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()));
  if valid {
    Ok(color.to_ascii_lowercase())
  } else {
    Err(Error::InvalidColor(color.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_color_uses_default() {
    let tag = NewTag::new("Beleza", None).unwrap();
    assert_eq!(tag.color, DEFAULT_TAG_COLOR);

    let tag = NewTag::new("Beleza", Some("  ")).unwrap();
    assert_eq!(tag.color, DEFAULT_TAG_COLOR);
  }

  #[test]
  fn blank_name_is_rejected() {
    assert!(matches!(NewTag::new("   ", None), Err(Error::MissingTagName)));
    assert!(matches!(
      TagPatch::new(Some(""), None),
      Err(Error::MissingTagName)
    ));
  }

  #[test]
  fn colors_are_validated_and_lowercased() {
    assert_eq!(NewTag::new("Make", Some("#8B5CF6")).unwrap().color, "#8b5cf6");
    assert_eq!(NewTag::new("Make", Some("#fff")).unwrap().color, "#fff");
    assert!(matches!(
      NewTag::new("Make", Some("purple")),
      Err(Error::InvalidColor(_))
    ));
    assert!(matches!(
      NewTag::new("Make", Some("#12345")),
      Err(Error::InvalidColor(_))
    ));
  }
}
