//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Follower counts are `INTEGER`.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;
use vitrine_core::{
  profile::Profile,
  tag::{Tag, TagSummary},
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Followers ────────────────────────────────────────────────────────────────

/// SQLite integers are signed; counts beyond `i64::MAX` saturate.
pub fn encode_followers(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_followers(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Case folding ─────────────────────────────────────────────────────────────

/// SQL name of the scalar function applying [`fold_case`] inside queries.
/// SQLite's own `lower()`, `LIKE` and `NOCASE` only fold ASCII.
pub const FOLD_FN: &str = "vitrine_fold";

/// Unicode-aware lowercase used on both sides of text comparisons.
pub fn fold_case(text: &str) -> String { text.to_lowercase() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawTag::from_row`], for a `tags` table aliased `t`.
pub const TAG_COLUMNS: &str = "t.tag_id, t.name, t.color, t.created_at";

/// Raw strings read directly from a `tags` row.
pub struct RawTag {
  pub tag_id:     String,
  pub name:       String,
  pub color:      String,
  pub created_at: String,
}

impl RawTag {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tag_id:     row.get(0)?,
      name:       row.get(1)?,
      color:      row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag {
      tag_id:     decode_uuid(&self.tag_id)?,
      name:       self.name,
      color:      self.color,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `tags` row followed by a profile count column.
pub struct RawTagSummary {
  pub tag:           RawTag,
  pub profile_count: i64,
}

impl RawTagSummary {
  pub fn into_summary(self) -> Result<TagSummary> {
    Ok(TagSummary {
      tag:           self.tag.into_tag()?,
      profile_count: decode_followers(self.profile_count),
    })
  }
}

/// Column list matching [`RawProfile::from_row`], for a `profiles` table
/// aliased `p`.
pub const PROFILE_COLUMNS: &str = "p.profile_id, p.username, p.full_name, \
   p.profile_pic, p.bio, p.followers, p.created_at, p.updated_at";

/// Raw strings read from a `profiles` row plus its joined tags.
pub struct RawProfile {
  pub profile_id:  String,
  pub username:    String,
  pub full_name:   String,
  pub profile_pic: String,
  pub bio:         String,
  pub followers:   i64,
  pub created_at:  String,
  pub updated_at:  String,
  pub tags:        Vec<RawTag>,
}

impl RawProfile {
  /// Read the profile columns; `tags` starts empty.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:  row.get(0)?,
      username:    row.get(1)?,
      full_name:   row.get(2)?,
      profile_pic: row.get(3)?,
      bio:         row.get(4)?,
      followers:   row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
      tags:        Vec::new(),
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      profile_id:  decode_uuid(&self.profile_id)?,
      username:    self.username,
      full_name:   self.full_name,
      profile_pic: self.profile_pic,
      bio:         self.bio,
      followers:   decode_followers(self.followers),
      tags:        self
        .tags
        .into_iter()
        .map(RawTag::into_tag)
        .collect::<Result<_>>()?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fold_case_handles_accents() {
    assert_eq!(fold_case("TENDÊNCIAS"), "tendências");
    assert_eq!(fold_case("Ação_100%"), "ação_100%");
  }

  #[test]
  fn followers_saturate_at_sqlite_bounds() {
    assert_eq!(encode_followers(u64::MAX), i64::MAX);
    assert_eq!(decode_followers(-1), 0);
    assert_eq!(decode_followers(encode_followers(1_000_000)), 1_000_000);
  }
}
