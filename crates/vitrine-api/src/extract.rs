//! Extractors whose rejections render as [`ApiError`], so malformed input
//! gets the same `{"error": …}` body and 400 status as every other
//! validation failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// [`axum::Json`] with a JSON rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// [`axum::extract::Path`] with a JSON rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// [`axum::extract::Query`] with a JSON rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
