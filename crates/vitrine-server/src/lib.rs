//! HTTP server assembly for Vitrine.
//!
//! Mounts [`vitrine_api`] under `/api` next to a health check, answers
//! unknown routes with JSON and wraps everything in per-client request
//! limiting, CORS, security headers and request tracing.

pub mod limit;
pub mod seed;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::{
  Json, Router,
  http::{HeaderName, HeaderValue, StatusCode},
  middleware,
  response::IntoResponse,
  routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::{
  cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use vitrine_api::ApiState;
use vitrine_core::store::CatalogStore;
use vitrine_scrape::{
  ImageRelay, InstagramSource, ProfileFetcher, ProfileSource, ScrapeConfig,
};

use crate::limit::{InboundLimitConfig, InboundLimiter};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `VITRINE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub scrape:     ScrapeConfig,
  #[serde(default)]
  pub rate_limit: InboundLimitConfig,
}

// ─── Application state ────────────────────────────────────────────────────────

/// State wired to the real profile service.
pub fn live_state<S: CatalogStore>(
  store: S,
  scrape: &ScrapeConfig,
) -> anyhow::Result<ApiState<S, InstagramSource>> {
  let source =
    InstagramSource::new(scrape).context("failed to build profile source client")?;
  let relay = ImageRelay::new(scrape).context("failed to build image relay client")?;
  Ok(ApiState {
    store:   Arc::new(store),
    fetcher: Arc::new(ProfileFetcher::new(source, scrape)),
    relay:   Arc::new(relay),
  })
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Hardening headers added to every response that does not set its own.
const SECURITY_HEADERS: [(&str, &str); 9] = [
  ("x-content-type-options", "nosniff"),
  ("x-frame-options", "SAMEORIGIN"),
  ("referrer-policy", "no-referrer"),
  ("x-dns-prefetch-control", "off"),
  ("strict-transport-security", "max-age=15552000; includeSubDomains"),
  ("x-download-options", "noopen"),
  ("x-permitted-cross-domain-policies", "none"),
  ("cross-origin-opener-policy", "same-origin"),
  ("cross-origin-resource-policy", "same-origin"),
];

/// Build the complete application router.
///
/// The request limit sits innermost so CORS preflights are answered before
/// they count against a client.
pub fn router<S, P>(state: ApiState<S, P>, limits: &InboundLimitConfig) -> Router
where
  S: CatalogStore + 'static,
  P: ProfileSource + 'static,
{
  let mut app = Router::new()
    .route("/health", get(health))
    .nest("/api", vitrine_api::api_router(state))
    .fallback(not_found);

  if limits.enabled {
    let limiter = Arc::new(InboundLimiter::new(limits.clone()));
    app = app.layer(middleware::from_fn_with_state(limiter, limit::limit_requests));
  }

  let app = app.layer(CorsLayer::permissive());
  SECURITY_HEADERS
    .iter()
    .fold(app, |app, &(name, value)| {
      app.layer(SetResponseHeaderLayer::if_not_present(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
      ))
    })
    .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
  Json(json!({ "status": "OK", "timestamp": Utc::now() }))
}

async fn not_found() -> impl IntoResponse {
  (StatusCode::NOT_FOUND, Json(json!({ "error": "route not found" })))
}
