//! HTTP-level tests for [`InstagramSource`], [`ProfileFetcher`] and
//! [`ImageRelay`] against local fake upstreams.

use axum::{
  Json, Router,
  body::Body,
  extract::Path,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
  routing::get,
};
use serde_json::json;
use tokio::{
  io::{AsyncReadExt as _, AsyncWriteExt as _},
  net::TcpListener,
};
use vitrine_core::record::RecordOrigin;

use crate::{
  FetchError, ImageRelay, InstagramSource, ProfileFetcher, ProfileSource, RelayError,
  ScrapeConfig, UpstreamError, fallback::known,
};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

async fn serve(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
  format!("http://{addr}")
}

/// An address nothing listens on.
async fn dead_address() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{addr}")
}

// ─── Fake profile service ────────────────────────────────────────────────────

async fn profile_page(Path(handle): Path<String>, headers: HeaderMap) -> Response {
  let browser_like = headers
    .get(header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ua| ua.starts_with("Mozilla/5.0"));
  if !browser_like {
    return StatusCode::FORBIDDEN.into_response();
  }

  match handle.to_lowercase().as_str() {
    "ghost" => StatusCode::NOT_FOUND.into_response(),
    "mariatest" => StatusCode::TOO_MANY_REQUESTS.into_response(),
    "bianca" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    "nouser" => Json(json!({ "data": {} })).into_response(),
    "garbage" => "<html>login required</html>".into_response(),
    "sparse" => Json(json!({
      "data": { "user": {
        "full_name": "",
        "biography": null,
        "profile_pic_url": "",
        "edge_followed_by": { "count": 7 }
      } }
    }))
    .into_response(),
    _ => Json(json!({
      "data": { "user": {
        "full_name": format!("Full {handle}"),
        "biography": "hello",
        "profile_pic_url": format!("https://cdn.example.com/{handle}.jpg?x=1&y=2"),
        "edge_followed_by": { "count": 4321 }
      } }
    }))
    .into_response(),
  }
}

async fn profile_service() -> ScrapeConfig {
  let base = serve(Router::new().route("/{handle}/", get(profile_page))).await;
  ScrapeConfig {
    upstream_base_url: base,
    min_spacing_ms: 0,
    ..ScrapeConfig::default()
  }
}

// ─── InstagramSource ─────────────────────────────────────────────────────────

#[tokio::test]
async fn source_parses_user_payload() {
  let source = InstagramSource::new(&profile_service().await).unwrap();
  let profile = source.lookup("Alice").await.unwrap();
  assert_eq!(profile.full_name.as_deref(), Some("Full Alice"));
  assert_eq!(profile.biography.as_deref(), Some("hello"));
  assert_eq!(profile.follower_count, Some(4321));
  assert_eq!(
    profile.profile_pic_url.as_deref(),
    Some("https://cdn.example.com/Alice.jpg?x=1&y=2")
  );
}

#[tokio::test]
async fn source_treats_empty_strings_as_missing() {
  let source = InstagramSource::new(&profile_service().await).unwrap();
  let profile = source.lookup("sparse").await.unwrap();
  assert_eq!(profile.full_name, None);
  assert_eq!(profile.biography, None);
  assert_eq!(profile.profile_pic_url, None);
  assert_eq!(profile.follower_count, Some(7));
}

#[tokio::test]
async fn source_classifies_failures() {
  let source = InstagramSource::new(&profile_service().await).unwrap();
  assert!(matches!(source.lookup("ghost").await, Err(UpstreamError::NotFound)));
  assert!(matches!(source.lookup("MariaTest").await, Err(UpstreamError::RateLimited)));
  assert!(matches!(source.lookup("bianca").await, Err(UpstreamError::Status(503))));
  assert!(matches!(source.lookup("nouser").await, Err(UpstreamError::Malformed(_))));
  assert!(matches!(source.lookup("garbage").await, Err(UpstreamError::Malformed(_))));
}

#[tokio::test]
async fn source_reports_refused_connections_as_unreachable() {
  let config = ScrapeConfig {
    upstream_base_url: dead_address().await,
    ..ScrapeConfig::default()
  };
  let source = InstagramSource::new(&config).unwrap();
  assert!(matches!(source.lookup("alice").await, Err(UpstreamError::Unreachable(_))));
}

// ─── ProfileFetcher over HTTP ────────────────────────────────────────────────

#[tokio::test]
async fn fetch_rate_limited_leaves_cache_empty() {
  let config = profile_service().await;
  let fetcher = ProfileFetcher::new(InstagramSource::new(&config).unwrap(), &config);

  let err = fetcher.fetch("@MariaTest").await.unwrap_err();
  assert!(matches!(err, FetchError::RateLimited));
  assert_eq!(fetcher.cache().get("mariatest").await, None);
}

#[tokio::test]
async fn fetch_live_profile_proxies_image() {
  let config = profile_service().await;
  let fetcher = ProfileFetcher::new(InstagramSource::new(&config).unwrap(), &config);

  let rec = fetcher.fetch("alice").await.unwrap();
  assert_eq!(rec.origin, RecordOrigin::Live);
  assert_eq!(
    rec.profile_image_ref,
    "/api/proxy-image?url=https%3A%2F%2Fcdn.example.com%2Falice.jpg%3Fx%3D1%26y%3D2"
  );
}

#[tokio::test]
async fn fetch_unresolvable_upstream_falls_back_for_known_handle() {
  let config = ScrapeConfig {
    upstream_base_url: "http://profiles.invalid".to_owned(),
    min_spacing_ms: 0,
    ..ScrapeConfig::default()
  };
  let fetcher = ProfileFetcher::new(InstagramSource::new(&config).unwrap(), &config);

  let rec = fetcher.fetch("bianca").await.unwrap();
  let entry = known("bianca").unwrap();
  assert_eq!(rec.display_name, entry.full_name);
  assert_eq!(rec.origin, RecordOrigin::KnownFallback);
  assert!(rec.profile_image_ref.starts_with("/api/proxy-image?url=https%3A%2F%2Finstagram."));
}

#[tokio::test]
async fn strict_fetch_surfaces_upstream_errors() {
  let config = profile_service().await;
  let fetcher = ProfileFetcher::new(InstagramSource::new(&config).unwrap(), &config);
  assert!(matches!(fetcher.fetch_strict("bianca").await, Err(FetchError::BadGateway(_))));
  assert!(matches!(fetcher.fetch_strict("ghost").await, Err(FetchError::NotFound(_))));
}

// ─── ImageRelay ──────────────────────────────────────────────────────────────

async fn image(Path(name): Path<String>, headers: HeaderMap) -> Response {
  if headers.get(header::REFERER).is_none() {
    return StatusCode::FORBIDDEN.into_response();
  }
  match name.as_str() {
    "pic.png" => ([(header::CONTENT_TYPE, "image/png")], PNG).into_response(),
    "untyped" => Response::new(Body::from(PNG)),
    "missing.jpg" => StatusCode::NOT_FOUND.into_response(),
    "busy.jpg" => StatusCode::TOO_MANY_REQUESTS.into_response(),
    _ => StatusCode::IM_A_TEAPOT.into_response(),
  }
}

async fn image_host() -> String {
  serve(Router::new().route("/img/{name}", get(image))).await
}

/// Answers one request with a chunked body and no `Content-Length`.
async fn chunked_image_host(body: &'static [u8]) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut request = [0u8; 1024];
    let _ = socket.read(&mut request).await;
    let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\n\
                Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
    let _ = socket.write_all(head.as_bytes()).await;
    for chunk in body.chunks(16) {
      let _ = socket.write_all(format!("{:x}\r\n", chunk.len()).as_bytes()).await;
      let _ = socket.write_all(chunk).await;
      let _ = socket.write_all(b"\r\n").await;
    }
    let _ = socket.write_all(b"0\r\n\r\n").await;
  });
  format!("http://{addr}")
}

fn relay_config() -> ScrapeConfig {
  ScrapeConfig {
    allow_private_hosts: true,
    ..ScrapeConfig::default()
  }
}

fn relay() -> ImageRelay { ImageRelay::new(&relay_config()).unwrap() }

fn capped_relay(max_image_bytes: usize) -> ImageRelay {
  ImageRelay::new(&ScrapeConfig { max_image_bytes, ..relay_config() }).unwrap()
}

#[tokio::test]
async fn relay_returns_bytes_and_content_type() {
  let host = image_host().await;
  let img = relay().relay(&format!("{host}/img/pic.png")).await.unwrap();
  assert_eq!(img.content_type, "image/png");
  assert_eq!(&img.bytes[..], PNG);
}

#[tokio::test]
async fn relay_defaults_content_type_to_jpeg() {
  let host = image_host().await;
  let img = relay().relay(&format!("{host}/img/untyped")).await.unwrap();
  assert_eq!(img.content_type, "image/jpeg");
}

#[tokio::test]
async fn relay_classifies_upstream_statuses() {
  let host = image_host().await;
  let relay = relay();
  assert!(matches!(
    relay.relay(&format!("{host}/img/missing.jpg")).await,
    Err(RelayError::NotFound)
  ));
  assert!(matches!(
    relay.relay(&format!("{host}/img/busy.jpg")).await,
    Err(RelayError::TooManyRequests)
  ));
  assert!(matches!(
    relay.relay(&format!("{host}/img/other")).await,
    Err(RelayError::BadGateway(_))
  ));
}

#[tokio::test]
async fn relay_unresolvable_host_is_bad_gateway() {
  let err = relay()
    .relay("http://images.invalid/pic.jpg")
    .await
    .unwrap_err();
  assert!(matches!(err, RelayError::BadGateway(_)));
}

#[tokio::test]
async fn relay_refuses_private_hosts_by_default() {
  let host = image_host().await;
  let relay = ImageRelay::new(&ScrapeConfig::default()).unwrap();
  for url in [
    format!("{host}/img/pic.png"),
    "http://localhost:9/img/pic.png".to_owned(),
    "http://169.254.169.254/latest/meta-data".to_owned(),
  ] {
    assert!(matches!(relay.relay(&url).await, Err(RelayError::Validation(_))), "{url}");
  }
}

#[tokio::test]
async fn relay_refuses_declared_oversize_body() {
  let host = image_host().await;
  let err = capped_relay(4).relay(&format!("{host}/img/pic.png")).await.unwrap_err();
  assert!(matches!(err, RelayError::BadGateway(ref m) if m.contains("exceeds 4 bytes")));
}

#[tokio::test]
async fn relay_caps_chunked_body() {
  static BODY: [u8; 64] = [7; 64];

  let host = chunked_image_host(&BODY).await;
  let err = capped_relay(40).relay(&format!("{host}/big.png")).await.unwrap_err();
  assert!(matches!(err, RelayError::BadGateway(ref m) if m.contains("exceeds 40 bytes")));

  let host = chunked_image_host(&BODY).await;
  let img = capped_relay(64).relay(&format!("{host}/big.png")).await.unwrap();
  assert_eq!(img.content_type, "image/png");
  assert_eq!(&img.bytes[..], &BODY[..]);
}
