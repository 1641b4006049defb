//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use vitrine_core::store::StoreError;
use vitrine_scrape::{FetchError, RelayError};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("rate limited: {0}")]
  TooManyRequests(String),

  #[error("bad gateway: {0}")]
  BadGateway(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Refused writes are the client's fault; everything else is ours.
  pub fn store<E: StoreError>(e: E) -> Self {
    if e.is_rejection() {
      ApiError::BadRequest(e.to_string())
    } else {
      ApiError::Store(Box::new(e))
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::TooManyRequests(m) => (StatusCode::TOO_MANY_REQUESTS, m.clone()),
      ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<vitrine_core::Error> for ApiError {
  fn from(e: vitrine_core::Error) -> Self { ApiError::BadRequest(e.to_string()) }
}

impl From<JsonRejection> for ApiError {
  fn from(e: JsonRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(e: PathRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(e: QueryRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl From<FetchError> for ApiError {
  fn from(e: FetchError) -> Self {
    let message = e.to_string();
    match e {
      FetchError::Validation(_) => ApiError::BadRequest(message),
      FetchError::NotFound(_) => ApiError::NotFound(message),
      FetchError::RateLimited => ApiError::TooManyRequests(message),
      FetchError::UpstreamUnreachable(_) | FetchError::BadGateway(_) => {
        ApiError::BadGateway(message)
      }
    }
  }
}

impl From<RelayError> for ApiError {
  fn from(e: RelayError) -> Self {
    let message = e.to_string();
    match e {
      RelayError::Validation(_) => ApiError::BadRequest(message),
      RelayError::NotFound => ApiError::NotFound(message),
      RelayError::TooManyRequests => ApiError::TooManyRequests(message),
      RelayError::BadGateway(_) => ApiError::BadGateway(message),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn status_of(e: impl Into<ApiError>) -> StatusCode {
    e.into().into_response().status()
  }

  #[test]
  fn fetch_errors_map_to_statuses() {
    assert_eq!(status_of(FetchError::Validation("x".into())), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(FetchError::NotFound("ghost".into())), StatusCode::NOT_FOUND);
    assert_eq!(status_of(FetchError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
      status_of(FetchError::UpstreamUnreachable("dns".into())),
      StatusCode::BAD_GATEWAY
    );
    assert_eq!(status_of(FetchError::BadGateway("500".into())), StatusCode::BAD_GATEWAY);
  }

  #[test]
  fn relay_errors_map_to_statuses() {
    assert_eq!(status_of(RelayError::Validation("x".into())), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(RelayError::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_of(RelayError::TooManyRequests), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(status_of(RelayError::BadGateway("x".into())), StatusCode::BAD_GATEWAY);
  }

  #[test]
  fn validation_errors_are_bad_requests() {
    assert_eq!(status_of(vitrine_core::Error::MissingUsername), StatusCode::BAD_REQUEST);
  }

  #[derive(Debug, Error)]
  #[error("boom")]
  struct Boom(bool);

  impl StoreError for Boom {
    fn is_rejection(&self) -> bool { self.0 }
  }

  #[test]
  fn store_errors_split_on_rejection() {
    assert_eq!(status_of(ApiError::store(Boom(true))), StatusCode::BAD_REQUEST);
    assert_eq!(
      status_of(ApiError::store(Boom(false))),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }
}
