//! `GET /proxy-image?url=<encoded>`: relay a remote profile image.
//!
//! Successful responses are cacheable for a year and readable from any
//! origin, including as a cross-origin `<img>` embed; failures are the usual
//! JSON error.

use axum::{
  extract::State,
  http::{HeaderName, HeaderValue, header},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use vitrine_core::store::CatalogStore;
use vitrine_scrape::ProfileSource;

use crate::{ApiState, error::ApiError, extract::ApiQuery};

const CACHE_FOR_A_YEAR: &str = "public, max-age=31536000";

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
  pub url: Option<String>,
}

pub async fn handler<S, P>(
  State(state): State<ApiState<S, P>>,
  ApiQuery(params): ApiQuery<ProxyParams>,
) -> Result<Response, ApiError>
where
  S: CatalogStore,
  P: ProfileSource,
{
  let url = params.url.unwrap_or_default();
  let image = state.relay.relay(&url).await?;

  let content_type = HeaderValue::from_str(&image.content_type)
    .unwrap_or_else(|_| HeaderValue::from_static("image/jpeg"));

  let headers = [
    (header::CONTENT_TYPE, content_type),
    (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_FOR_A_YEAR)),
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
    (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET")),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type")),
    (
      HeaderName::from_static("cross-origin-resource-policy"),
      HeaderValue::from_static("cross-origin"),
    ),
  ];
  Ok((headers, image.bytes).into_response())
}
