//! Handlers for `/profiles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/profiles` | Optional `?search=<text>&tag=<name>` |
//! | `POST`   | `/profiles` | Body: `{"username":"…","tags":[<tag id>]}` |
//! | `GET`    | `/profiles/:id` | 404 if not found |
//! | `PUT`    | `/profiles/:id` | Partial update; `tags` replaces the set |
//! | `DELETE` | `/profiles/:id` | 404 if not found |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;
use vitrine_core::{
  profile::{NewProfile, Profile, ProfileFilter, ProfilePatch},
  store::CatalogStore,
};
use vitrine_scrape::{Handle, ProfileSource};

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub search: Option<String>,
  pub tag:    Option<String>,
}

/// `GET /profiles[?search=<text>][&tag=<name>]`
pub async fn list<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Profile>>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let filter = ProfileFilter {
    text: params.search,
    tag:  params.tag,
  };
  let profiles = state
    .store
    .list_profiles(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profiles))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username: Option<String>,
  #[serde(default)]
  pub tags:     Vec<Uuid>,
}

/// `POST /profiles`: look the handle up (gracefully) and catalogue it.
pub async fn create<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiJson(body): ApiJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let raw = body.username.unwrap_or_default();
  if raw.trim().is_empty() {
    return Err(vitrine_core::Error::MissingUsername.into());
  }
  let handle = Handle::parse(&raw)?;

  let existing = state
    .store
    .find_profile_by_username(handle.as_str())
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::BadRequest(format!(
      "profile @{handle} is already registered"
    )));
  }

  let record = state.fetcher.fetch(handle.as_str()).await?;
  if record.origin.is_fallback() {
    warn!(%handle, origin = ?record.origin, "cataloguing profile from fallback data");
  }

  let input = NewProfile::from_record(handle.as_str(), record, body.tags)?;
  let profile = state
    .store
    .create_profile(input)
    .await
    .map_err(ApiError::store)?;

  info!(%handle, profile_id = %profile.profile_id, "profile created");
  Ok((StatusCode::CREATED, Json(profile)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /profiles/:id`
pub async fn get_one<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let profile = state
    .store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(profile))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub full_name: Option<String>,
  pub bio:       Option<String>,
  pub followers: Option<u64>,
  pub tags:      Option<Vec<Uuid>>,
}

/// `PUT /profiles/:id`
pub async fn update_one<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<UpdateBody>,
) -> Result<Json<Profile>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let patch = ProfilePatch {
    full_name: body.full_name,
    bio:       body.bio,
    followers: body.followers,
    tag_ids:   body.tags,
  };
  let profile = state
    .store
    .update_profile(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(profile))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /profiles/:id`
pub async fn delete_one<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let deleted = state
    .store
    .delete_profile(id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("profile {id} not found")));
  }
  info!(profile_id = %id, "profile deleted");
  Ok(Json(json!({ "message": "profile deleted" })))
}
