//! [`InstagramSource`]: the production [`ProfileSource`], backed by the
//! public web profile JSON endpoint.

use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
  config::ScrapeConfig,
  source::{ProfileSource, UpstreamError, UpstreamProfile},
};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
  data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
  user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
  full_name:        Option<String>,
  biography:        Option<String>,
  profile_pic_url:  Option<String>,
  edge_followed_by: Option<WireCount>,
}

#[derive(Debug, Deserialize)]
struct WireCount {
  count: u64,
}

/// Empty strings mean "not set" upstream.
fn non_empty(s: Option<String>) -> Option<String> { s.filter(|s| !s.trim().is_empty()) }

impl From<WireUser> for UpstreamProfile {
  fn from(u: WireUser) -> Self {
    Self {
      full_name:       non_empty(u.full_name),
      biography:       non_empty(u.biography),
      follower_count:  u.edge_followed_by.map(|c| c.count),
      profile_pic_url: non_empty(u.profile_pic_url),
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// HTTP client for `GET {base}/{handle}/?__a=1&__d=1`.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct InstagramSource {
  client:   Client,
  base_url: String,
}

impl InstagramSource {
  pub fn new(config: &ScrapeConfig) -> Result<Self, reqwest::Error> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
      header::ACCEPT,
      header::HeaderValue::from_static(
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
      ),
    );
    headers.insert(
      header::ACCEPT_LANGUAGE,
      header::HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::DNT, header::HeaderValue::from_static("1"));
    headers.insert(
      header::UPGRADE_INSECURE_REQUESTS,
      header::HeaderValue::from_static("1"),
    );

    let client = Client::builder()
      .user_agent(USER_AGENT)
      .default_headers(headers)
      .timeout(config.request_timeout())
      .build()?;

    Ok(Self {
      client,
      base_url: config.upstream_base_url.trim_end_matches('/').to_owned(),
    })
  }

  fn url(&self, handle: &str) -> String {
    format!("{}/{handle}/?__a=1&__d=1", self.base_url)
  }
}

impl ProfileSource for InstagramSource {
  async fn lookup(&self, handle: &str) -> Result<UpstreamProfile, UpstreamError> {
    info!(%handle, "querying profile source");

    let resp = self
      .client
      .get(self.url(handle))
      .send()
      .await
      .map_err(|e| {
        warn!(%handle, error = %e, "profile source request failed");
        if e.is_connect() || e.is_timeout() {
          UpstreamError::Unreachable(e.to_string())
        } else {
          UpstreamError::Malformed(e.to_string())
        }
      })?;

    match resp.status() {
      StatusCode::TOO_MANY_REQUESTS => return Err(UpstreamError::RateLimited),
      StatusCode::NOT_FOUND => return Err(UpstreamError::NotFound),
      s if !s.is_success() => return Err(UpstreamError::Status(s.as_u16())),
      _ => {}
    }

    let envelope: Envelope = resp
      .json()
      .await
      .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    envelope
      .data
      .and_then(|d| d.user)
      .map(UpstreamProfile::from)
      .ok_or_else(|| UpstreamError::Malformed("response carries no user".to_owned()))
  }
}
