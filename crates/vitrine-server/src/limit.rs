//! Per-client inbound request limiting.
//!
//! Every client IP gets a fixed window of `window_secs` in which it may make
//! `max_requests` requests. Further requests inside the window are answered
//! with a JSON 429 and a `Retry-After` header. Behind a reverse proxy the
//! client IP is read from `X-Forwarded-For`, trusting `trust_proxy_hops`
//! entries counted from the right.

use std::{
  collections::HashMap,
  net::{IpAddr, Ipv4Addr, SocketAddr},
  sync::Arc,
  time::Duration,
};

use axum::{
  Json,
  extract::{ConnectInfo, Request, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tokio::{sync::Mutex, time::Instant};
use tracing::warn;

/// Windows are swept for expiry once the map holds this many clients.
const SWEEP_THRESHOLD: usize = 1_024;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InboundLimitConfig {
  pub enabled:          bool,
  pub max_requests:     u32,
  pub window_secs:      u64,
  /// Number of reverse proxies in front of the server whose
  /// `X-Forwarded-For` entries are trusted. Zero ignores the header.
  pub trust_proxy_hops: usize,
}

impl Default for InboundLimitConfig {
  fn default() -> Self {
    Self {
      enabled:          true,
      max_requests:     100,
      window_secs:      15 * 60,
      trust_proxy_hops: 1,
    }
  }
}

impl InboundLimitConfig {
  pub fn window(&self) -> Duration { Duration::from_secs(self.window_secs) }
}

// ─── Limiter ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
  Allowed { remaining: u32 },
  Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
  started: Instant,
  count:   u32,
}

#[derive(Debug)]
pub struct InboundLimiter {
  config:  InboundLimitConfig,
  windows: Mutex<HashMap<IpAddr, Window>>,
}

impl InboundLimiter {
  pub fn new(config: InboundLimitConfig) -> Self {
    Self { config, windows: Mutex::new(HashMap::new()) }
  }

  pub fn config(&self) -> &InboundLimitConfig { &self.config }

  /// Count one request from `ip` against its current window.
  pub async fn admit(&self, ip: IpAddr) -> Admission {
    let now = Instant::now();
    let window = self.config.window();
    let mut windows = self.windows.lock().await;

    if windows.len() >= SWEEP_THRESHOLD {
      windows.retain(|_, w| now.duration_since(w.started) < window);
    }

    let entry = windows.entry(ip).or_insert(Window { started: now, count: 0 });
    if now.duration_since(entry.started) >= window {
      *entry = Window { started: now, count: 0 };
    }

    if entry.count >= self.config.max_requests {
      return Admission::Limited {
        retry_after: window.saturating_sub(now.duration_since(entry.started)),
      };
    }
    entry.count += 1;
    Admission::Allowed { remaining: self.config.max_requests - entry.count }
  }
}

// ─── Client address ───────────────────────────────────────────────────────────

/// Resolve the client IP the way a proxy-aware server does: walk from the
/// socket peer leftwards through `X-Forwarded-For`, skipping at most
/// `trust_hops` trusted proxies.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_hops: usize) -> IpAddr {
  let peer = peer.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
  if trust_hops == 0 {
    return peer;
  }

  let forwarded: Vec<IpAddr> = headers
    .get_all("x-forwarded-for")
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .filter_map(|s| s.trim().parse().ok())
    .collect();

  // Nearest hop first: the peer, then forwarded entries right to left.
  let chain: Vec<IpAddr> =
    std::iter::once(peer).chain(forwarded.into_iter().rev()).collect();
  chain[trust_hops.min(chain.len() - 1)]
}

// ─── Middleware ───────────────────────────────────────────────────────────────

/// Axum middleware enforcing an [`InboundLimiter`].
pub async fn limit_requests(
  State(limiter): State<Arc<InboundLimiter>>,
  req: Request,
  next: Next,
) -> Response {
  let peer = req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip());
  let ip = client_ip(req.headers(), peer, limiter.config().trust_proxy_hops);
  let max = limiter.config().max_requests;

  match limiter.admit(ip).await {
    Admission::Allowed { remaining } => {
      let mut resp = next.run(req).await;
      let headers = resp.headers_mut();
      headers.insert("x-ratelimit-limit", HeaderValue::from(max));
      headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
      resp
    }
    Admission::Limited { retry_after } => {
      warn!(%ip, "inbound request limit exceeded");
      let secs = retry_after.as_secs().max(1);
      let mut resp = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "too many requests, please try again later" })),
      )
        .into_response();
      let headers = resp.headers_mut();
      headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
      headers.insert("x-ratelimit-limit", HeaderValue::from(max));
      headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
      resp
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn limiter(max_requests: u32) -> InboundLimiter {
    InboundLimiter::new(InboundLimitConfig {
      max_requests,
      window_secs: 60,
      ..InboundLimitConfig::default()
    })
  }

  fn ip(s: &str) -> IpAddr { s.parse().unwrap() }

  #[tokio::test(start_paused = true)]
  async fn window_limits_then_resets() {
    let limiter = limiter(2);
    let a = ip("203.0.113.7");

    assert_eq!(limiter.admit(a).await, Admission::Allowed { remaining: 1 });
    assert_eq!(limiter.admit(a).await, Admission::Allowed { remaining: 0 });
    tokio::time::advance(Duration::from_secs(20)).await;
    assert_eq!(
      limiter.admit(a).await,
      Admission::Limited { retry_after: Duration::from_secs(40) }
    );

    tokio::time::advance(Duration::from_secs(40)).await;
    assert_eq!(limiter.admit(a).await, Admission::Allowed { remaining: 1 });
  }

  #[tokio::test(start_paused = true)]
  async fn clients_are_counted_separately() {
    let limiter = limiter(1);
    assert!(matches!(limiter.admit(ip("10.0.0.1")).await, Admission::Allowed { .. }));
    assert!(matches!(limiter.admit(ip("10.0.0.1")).await, Admission::Limited { .. }));
    assert!(matches!(limiter.admit(ip("10.0.0.2")).await, Admission::Allowed { .. }));
  }

  #[test]
  fn client_ip_trusts_configured_hops() {
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.1, 203.0.113.9"));
    let peer = Some(ip("127.0.0.1"));

    assert_eq!(client_ip(&headers, peer, 0), ip("127.0.0.1"));
    assert_eq!(client_ip(&headers, peer, 1), ip("203.0.113.9"));
    assert_eq!(client_ip(&headers, peer, 2), ip("198.51.100.1"));
    assert_eq!(client_ip(&headers, peer, 9), ip("198.51.100.1"));
    assert_eq!(client_ip(&HeaderMap::new(), peer, 1), ip("127.0.0.1"));
    assert_eq!(client_ip(&HeaderMap::new(), None, 1), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
  }
}
