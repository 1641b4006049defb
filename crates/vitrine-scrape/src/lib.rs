//! External profile lookup for Vitrine.
//!
//! [`ProfileFetcher`] answers "who is handle X?" by consulting a
//! [`ProfileCache`], throttling misses through a [`RateGate`], calling a
//! pluggable [`ProfileSource`] and, when the upstream misbehaves, degrading to
//! a built-in table of known handles. [`ImageRelay`] forwards profile images
//! for clients that cannot load them directly.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

mod cache;
mod fallback;
mod fetcher;
mod gate;
mod handle;
mod instagram;
mod relay;

pub mod config;
pub mod error;
pub mod source;

pub use cache::ProfileCache;
pub use config::ScrapeConfig;
pub use error::{FetchError, RelayError};
pub use fallback::{GENERIC_BIOGRAPHY, GENERIC_FOLLOWERS, KNOWN_PROFILES, KnownProfile};
pub use fetcher::ProfileFetcher;
pub use gate::RateGate;
pub use handle::{Handle, cache_key};
pub use instagram::InstagramSource;
pub use relay::{ImageRelay, RelayedImage};
pub use source::{ProfileSource, UpstreamError, UpstreamProfile};

#[cfg(test)]
mod tests;
