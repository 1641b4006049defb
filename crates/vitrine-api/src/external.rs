//! `POST /profiles/search-external`: look a handle up without cataloguing it.
//!
//! Body: `{"handle":"@someone","strict":false}`. The default is the graceful
//! lookup, which degrades to fallback data; `strict` surfaces every upstream
//! failure instead.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::info;
use vitrine_core::{record::ProfileRecord, store::CatalogStore};
use vitrine_scrape::ProfileSource;

use crate::{ApiState, error::ApiError, extract::ApiJson};

#[derive(Debug, Deserialize)]
pub struct SearchBody {
  pub handle: Option<String>,
  #[serde(default)]
  pub strict: bool,
}

pub async fn search<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiJson(body): ApiJson<SearchBody>,
) -> Result<Json<ProfileRecord>, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let handle = body
    .handle
    .ok_or_else(|| ApiError::BadRequest("handle is required".into()))?;

  let record = if body.strict {
    state.fetcher.fetch_strict(&handle).await?
  } else {
    state.fetcher.fetch(&handle).await?
  };

  info!(handle = %handle.trim(), origin = ?record.origin, "external profile search");
  Ok(Json(record))
}
