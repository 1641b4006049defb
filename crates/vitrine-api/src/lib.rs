//! JSON REST API for Vitrine.
//!
//! Exposes an axum [`Router`] backed by any [`CatalogStore`] and any
//! [`ProfileSource`]. Health checks, CORS and tracing are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vitrine_api::api_router(state))
//! ```

pub mod error;
pub mod extract;
pub mod external;
pub mod profiles;
pub mod proxy;
pub mod tags;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use vitrine_core::store::CatalogStore;
use vitrine_scrape::{ImageRelay, ProfileFetcher, ProfileSource};

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all API handlers.
pub struct ApiState<S, P> {
  pub store:   Arc<S>,
  pub fetcher: Arc<ProfileFetcher<P>>,
  pub relay:   Arc<ImageRelay>,
}

// Derived `Clone` would demand `S: Clone, P: Clone`.
impl<S, P> Clone for ApiState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      fetcher: Arc::clone(&self.fetcher),
      relay:   Arc::clone(&self.relay),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(state: ApiState<S, P>) -> Router<()>
where
  S: CatalogStore + 'static,
  P: ProfileSource + 'static,
{
  Router::new()
    // Profiles
    .route(
      "/profiles",
      get(profiles::list::<S, P>).post(profiles::create::<S, P>),
    )
    .route("/profiles/search-external", post(external::search::<S, P>))
    .route(
      "/profiles/{id}",
      get(profiles::get_one::<S, P>)
        .put(profiles::update_one::<S, P>)
        .delete(profiles::delete_one::<S, P>),
    )
    // Tags
    .route("/tags", get(tags::list::<S, P>).post(tags::create::<S, P>))
    .route(
      "/tags/{id}",
      get(tags::get_one::<S, P>)
        .put(tags::update_one::<S, P>)
        .delete(tags::delete_one::<S, P>),
    )
    // Images
    .route("/proxy-image", get(proxy::handler::<S, P>))
    .with_state(state)
}
