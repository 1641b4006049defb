//! Handlers for `/tags` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tags` | Ordered by name, with profile counts |
//! | `POST`   | `/tags` | Body: `{"name":"…","color":"#rrggbb"}` |
//! | `GET`    | `/tags/:id` | Includes the tagged profiles |
//! | `PUT`    | `/tags/:id` | Partial update |
//! | `DELETE` | `/tags/:id` | Profiles keep existing |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;
use vitrine_core::{
  store::CatalogStore,
  tag::{NewTag, Tag, TagDetail, TagPatch, TagSummary},
};
use vitrine_scrape::ProfileSource;

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

/// `GET /tags`
pub async fn list<S, P>(
  State(state): State<ApiState<S, P>>,
) -> Result<Json<Vec<TagSummary>>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let tags = state.store.list_tags().await.map_err(ApiError::store)?;
  Ok(Json(tags))
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
  pub name:  Option<String>,
  pub color: Option<String>,
}

/// `POST /tags`
pub async fn create<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiJson(body): ApiJson<TagBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let input = NewTag::new(body.name.as_deref().unwrap_or_default(), body.color.as_deref())?;

  let existing = state
    .store
    .find_tag_by_name(&input.name)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::BadRequest(format!("tag {:?} already exists", input.name)));
  }

  let tag = state.store.create_tag(input).await.map_err(ApiError::store)?;
  info!(tag_id = %tag.tag_id, name = %tag.name, "tag created");
  Ok((StatusCode::CREATED, Json(tag)))
}

/// `GET /tags/:id`
pub async fn get_one<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<TagDetail>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let tag = state
    .store
    .get_tag(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tag {id} not found")))?;
  Ok(Json(tag))
}

/// `PUT /tags/:id`
pub async fn update_one<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<TagBody>,
) -> Result<Json<Tag>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let patch = TagPatch::new(body.name.as_deref(), body.color.as_deref())?;
  let tag = state
    .store
    .update_tag(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tag {id} not found")))?;
  Ok(Json(tag))
}

/// `DELETE /tags/:id`
pub async fn delete_one<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  if !state.store.delete_tag(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("tag {id} not found")));
  }
  info!(tag_id = %id, "tag deleted");
  Ok(Json(json!({ "message": "tag deleted" })))
}
