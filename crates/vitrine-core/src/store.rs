//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `vitrine-store-sqlite`).
//! Higher layers (`vitrine-api`, `vitrine-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  profile::{NewProfile, Profile, ProfileFilter, ProfilePatch},
  tag::{NewTag, Tag, TagDetail, TagPatch, TagSummary},
};

/// Backend errors, classified just enough for callers to answer a client.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the write was refused because of its input (a taken
  /// username or tag name, an unknown tag id) rather than a backend fault.
  fn is_rejection(&self) -> bool;
}

/// Abstraction over a Vitrine catalog backend.
///
/// Profiles and tags form a many-to-many relation; deleting either side
/// removes the links but never the other side.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: StoreError;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// Persist a new tag. Fails if the name is already taken.
  fn create_tag(
    &self,
    input: NewTag,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  /// Retrieve a tag and the profiles carrying it. `None` if not found.
  fn get_tag(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TagDetail>, Self::Error>> + Send + '_;

  /// Look up a tag by its exact (case-sensitive) name.
  fn find_tag_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + 'a;

  /// All tags ordered by name, each with its profile count.
  fn list_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<TagSummary>, Self::Error>> + Send + '_;

  /// Apply `patch`; returns `None` if the tag does not exist.
  fn update_tag(
    &self,
    id: Uuid,
    patch: TagPatch,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  /// Delete a tag; returns `false` if it did not exist.
  fn delete_tag(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Persist a new profile and connect its tags. Fails if the username is
  /// already taken or a tag id is unknown.
  fn create_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Retrieve a profile with its tags. `None` if not found.
  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Look up a profile by its exact (case-sensitive) username.
  fn find_profile_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Profiles matching `filter`, most-followed first.
  fn list_profiles<'a>(
    &'a self,
    filter: &'a ProfileFilter,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + 'a;

  /// Apply `patch`; returns `None` if the profile does not exist.
  fn update_profile(
    &self,
    id: Uuid,
    patch: ProfilePatch,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Delete a profile; returns `false` if it did not exist.
  fn delete_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
