//! Profiles: the catalog entries, one per influencer account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, record::ProfileRecord, tag::Tag};

/// A catalogued influencer. `username` is unique and compared
/// case-sensitively by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub profile_id:  Uuid,
  pub username:    String,
  pub full_name:   String,
  /// Proxied image reference or placeholder URL.
  pub profile_pic: String,
  pub bio:         String,
  pub followers:   u64,
  pub tags:        Vec<Tag>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CatalogStore::create_profile`].
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub username:    String,
  pub full_name:   String,
  pub profile_pic: String,
  pub bio:         String,
  pub followers:   u64,
  /// Tags to connect; every id must already exist.
  pub tag_ids:     Vec<Uuid>,
}

impl NewProfile {
  /// Build a profile from a looked-up [`ProfileRecord`]. The username is
  /// stored exactly as the caller typed it.
  pub fn from_record(
    username: &str,
    record: ProfileRecord,
    tag_ids: Vec<Uuid>,
  ) -> Result<Self> {
    let username = username.trim();
    if username.is_empty() {
      return Err(Error::MissingUsername);
    }
    Ok(Self {
      username: username.to_owned(),
      full_name: record.display_name,
      profile_pic: record.profile_image_ref,
      bio: record.biography,
      followers: record.follower_count,
      tag_ids,
    })
  }
}

/// Partial update for a profile. `None` leaves a field untouched;
/// `tag_ids: Some(..)` replaces the whole tag set.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
  pub full_name: Option<String>,
  pub bio:       Option<String>,
  pub followers: Option<u64>,
  pub tag_ids:   Option<Vec<Uuid>>,
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::CatalogStore::list_profiles`].
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
  /// Case-insensitive substring matched against username, full name and bio.
  pub text: Option<String>,
  /// Case-insensitive exact tag name; the profile must carry it.
  pub tag:  Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::RecordOrigin;

  fn record() -> ProfileRecord {
    ProfileRecord {
      display_name:      "Mari Maria".into(),
      profile_image_ref: "/api/proxy-image?url=x".into(),
      biography:         "Beauty".into(),
      follower_count:    42,
      origin:            RecordOrigin::Live,
    }
  }

  #[test]
  fn from_record_copies_every_field() {
    let tag = Uuid::new_v4();
    let p = NewProfile::from_record(" marimaria ", record(), vec![tag]).unwrap();
    assert_eq!(p.username, "marimaria");
    assert_eq!(p.full_name, "Mari Maria");
    assert_eq!(p.profile_pic, "/api/proxy-image?url=x");
    assert_eq!(p.bio, "Beauty");
    assert_eq!(p.followers, 42);
    assert_eq!(p.tag_ids, vec![tag]);
  }

  #[test]
  fn from_record_rejects_blank_username() {
    assert!(matches!(
      NewProfile::from_record("  ", record(), vec![]),
      Err(Error::MissingUsername)
    ));
  }
}
