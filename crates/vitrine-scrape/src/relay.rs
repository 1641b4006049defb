//! [`ImageRelay`]: server-side fetch of profile images.
//!
//! The upstream image host rejects browser requests that lack its referer, so
//! clients load images through us instead. Stateless: every call re-fetches.
//!
//! The relay only talks to public addresses. IP-literal and `localhost`
//! sources are refused up front, redirects are re-checked hop by hop, and
//! host names resolving only to private addresses fail at connect time.
//! Bodies larger than `max_image_bytes` are refused without being buffered.

use std::{
  net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
  sync::Arc,
};

use bytes::{Bytes, BytesMut};
use reqwest::{
  Client, StatusCode,
  dns::{Addrs, Name, Resolve, Resolving},
  header, redirect,
};
use tracing::warn;
use url::{Host, Url};

use crate::{RelayError, config::ScrapeConfig};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const REFERER: &str = "https://www.instagram.com/";
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
const MAX_REDIRECTS: usize = 5;

/// A fully-buffered image.
#[derive(Debug, Clone)]
pub struct RelayedImage {
  pub content_type: String,
  pub bytes:        Bytes,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ImageRelay {
  client:        Client,
  max_bytes:     usize,
  allow_private: bool,
}

impl ImageRelay {
  pub fn new(config: &ScrapeConfig) -> Result<Self, reqwest::Error> {
    let allow_private = config.allow_private_hosts;
    let redirects = redirect::Policy::custom(move |attempt| {
      if attempt.previous().len() >= MAX_REDIRECTS {
        attempt.error("too many redirects")
      } else if !allow_private && !host_is_public(attempt.url()) {
        attempt.error("redirect to a private address")
      } else {
        attempt.follow()
      }
    });

    let mut builder = Client::builder()
      .user_agent(USER_AGENT)
      .timeout(config.request_timeout())
      .redirect(redirects);
    if !allow_private {
      builder = builder.dns_resolver(Arc::new(PublicResolver));
    }

    Ok(Self {
      client: builder.build()?,
      max_bytes: config.max_image_bytes,
      allow_private,
    })
  }

  /// Fetch `source_url` and return its body. The body is read completely
  /// before anything is returned, so a failure never yields partial bytes.
  pub async fn relay(&self, source_url: &str) -> Result<RelayedImage, RelayError> {
    let url = parse_source(source_url)?;
    if !self.allow_private && !host_is_public(&url) {
      return Err(RelayError::Validation(format!(
        "{} is not a public host",
        url.host_str().unwrap_or_default()
      )));
    }

    let mut resp = self
      .client
      .get(url.clone())
      .header(header::REFERER, REFERER)
      .send()
      .await
      .map_err(|e| {
        warn!(%url, error = %e, "image relay request failed");
        RelayError::BadGateway(e.to_string())
      })?;

    match resp.status() {
      StatusCode::NOT_FOUND => return Err(RelayError::NotFound),
      StatusCode::TOO_MANY_REQUESTS => return Err(RelayError::TooManyRequests),
      s if !s.is_success() => {
        warn!(%url, status = %s, "image host refused relay");
        return Err(RelayError::BadGateway(format!("image host responded with {s}")));
      }
      _ => {}
    }

    let too_large =
      || RelayError::BadGateway(format!("image exceeds {} bytes", self.max_bytes));
    let declared = resp.content_length();
    if declared.is_some_and(|len| len > self.max_bytes as u64) {
      warn!(%url, declared = ?declared, "image too large to relay");
      return Err(too_large());
    }

    let content_type = resp
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .unwrap_or(DEFAULT_CONTENT_TYPE)
      .to_owned();

    // Content-Length may be absent or wrong; count what actually arrives.
    let capacity = declared.map_or(0, |len| len as usize);
    let mut body = BytesMut::with_capacity(capacity);
    while let Some(chunk) = resp.chunk().await.map_err(|e| {
      warn!(%url, error = %e, "image body interrupted");
      RelayError::BadGateway(e.to_string())
    })? {
      if body.len() + chunk.len() > self.max_bytes {
        warn!(%url, "image too large to relay");
        return Err(too_large());
      }
      body.extend_from_slice(&chunk);
    }

    Ok(RelayedImage { content_type, bytes: body.freeze() })
  }
}

fn parse_source(source_url: &str) -> Result<Url, RelayError> {
  let source_url = source_url.trim();
  if source_url.is_empty() {
    return Err(RelayError::Validation("image url is required".to_owned()));
  }
  let url =
    Url::parse(source_url).map_err(|e| RelayError::Validation(e.to_string()))?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    other => Err(RelayError::Validation(format!("unsupported scheme {other:?}"))),
  }
}

// ─── Address policy ───────────────────────────────────────────────────────────

/// False for `localhost` names and for IP literals outside public space.
/// Other names are judged after resolution by [`PublicResolver`].
fn host_is_public(url: &Url) -> bool {
  match url.host() {
    Some(Host::Domain(name)) => {
      let name = name.trim_end_matches('.').to_ascii_lowercase();
      name != "localhost" && !name.ends_with(".localhost")
    }
    Some(Host::Ipv4(ip)) => is_public_ip(IpAddr::V4(ip)),
    Some(Host::Ipv6(ip)) => is_public_ip(IpAddr::V6(ip)),
    None => false,
  }
}

fn is_public_ip(ip: IpAddr) -> bool {
  match ip {
    IpAddr::V4(v4) => is_public_v4(v4),
    IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
      Some(v4) => is_public_v4(v4),
      None => is_public_v6(v6),
    },
  }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
  let [a, b, ..] = ip.octets();
  !(ip.is_loopback()
    || ip.is_private()
    || ip.is_link_local()
    || ip.is_unspecified()
    || ip.is_broadcast()
    || ip.is_multicast()
    || a == 0
    || (a == 100 && (64..128).contains(&b)))
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
  let first = ip.segments()[0];
  !(ip.is_loopback()
    || ip.is_unspecified()
    || ip.is_multicast()
    || (first & 0xfe00) == 0xfc00
    || (first & 0xffc0) == 0xfe80)
}

/// Resolves like the system resolver but drops non-public addresses, failing
/// names that have nothing else.
struct PublicResolver;

impl Resolve for PublicResolver {
  fn resolve(&self, name: Name) -> Resolving {
    Box::pin(resolve_public(name.as_str().to_owned()))
  }
}

async fn resolve_public(
  host: String,
) -> Result<Addrs, Box<dyn std::error::Error + Send + Sync>> {
  let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
    .await?
    .filter(|addr| is_public_ip(addr.ip()))
    .collect();
  if addrs.is_empty() {
    return Err(format!("{host} has no public address").into());
  }
  Ok(Box::new(addrs.into_iter()))
}
