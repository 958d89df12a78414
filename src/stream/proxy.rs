//! Same-origin media relay
//!
//! Fetches a client-specified URL with the referer/origin the hosting CDN
//! expects, streams the body back and adds permissive CORS headers so the
//! browser's adaptive-streaming client can load it. HLS playlists can be
//! rewritten so every segment is fetched through the relay as well.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stream::negotiator::ProxyRoutes;
use crate::stream::subtitles;

pub const DEFAULT_REFERER: &str = "https://uqloads.xyz";
pub const DEFAULT_ORIGIN: &str = "https://uqloads.xyz";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const HLS_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Response headers copied from upstream besides Content-Type
const FORWARDED_HEADERS: &[header::HeaderName] = &[
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
];

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Unsupported URL scheme")]
    UnsupportedScheme,

    #[error("Failed to fetch video")]
    Upstream,

    #[error("Failed to fetch subtitle")]
    SubtitleUpstream,
}

#[derive(Debug, Serialize)]
struct ProxyErrorBody {
    error: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(ProxyErrorBody {
            error: self.to_string(),
        });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// `?url=` query accepted by the relay routes
#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}

/// Headers sent upstream in place of the browser's own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamHeaders {
    pub referer: String,
    pub origin: String,
    pub user_agent: String,
}

impl Default for UpstreamHeaders {
    fn default() -> Self {
        Self {
            referer: DEFAULT_REFERER.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Stateless relay shared by all proxy requests
#[derive(Clone)]
pub struct ProxyRelay {
    client: reqwest::Client,
    headers: UpstreamHeaders,
    routes: ProxyRoutes,
    rewrite_playlists: bool,
}

impl ProxyRelay {
    pub fn new(headers: UpstreamHeaders, routes: ProxyRoutes, rewrite_playlists: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            headers,
            routes,
            rewrite_playlists,
        }
    }

    pub fn routes(&self) -> &ProxyRoutes {
        &self.routes
    }

    /// Relay a media URL (playlist, segment or progressive file)
    pub async fn relay(
        &self,
        url: Option<&str>,
        client_headers: &HeaderMap,
    ) -> Result<Response, ProxyError> {
        let url = validate_url(url)?;

        // Playlists are fetched whole so they can be rewritten
        let rewrite_target = self.rewrite_playlists && is_playlist("", url);
        let mut request = self.upstream_request(url);
        if let Some(range) = client_headers.get(header::RANGE).filter(|_| !rewrite_target) {
            request = request.header(header::RANGE, range.clone());
        }

        let upstream = request.send().await.map_err(|e| {
            tracing::error!(%url, "Error proxying video: {}", e);
            ProxyError::Upstream
        })?;

        let status = upstream.status();
        if !status.is_success() {
            tracing::error!(%url, %status, "Error proxying video: upstream status");
            return Err(ProxyError::Upstream);
        }

        let content_type = upstream
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // A partial playlist cannot be rewritten and is passed through as is
        if self.rewrite_playlists
            && status != StatusCode::PARTIAL_CONTENT
            && is_playlist(&content_type, url)
        {
            let text = upstream.text().await.map_err(|e| {
                tracing::error!(%url, "Error reading playlist: {}", e);
                ProxyError::Upstream
            })?;
            let rewritten = rewrite_playlist(&text, url, &self.routes);
            tracing::debug!(%url, "Rewrote HLS playlist");
            return Ok(with_cors(Response::builder().status(StatusCode::OK))
                .header(header::CONTENT_TYPE, HLS_CONTENT_TYPE)
                .header(header::CACHE_CONTROL, "no-cache")
                .body(Body::from(rewritten))
                .unwrap_or_else(|_| ProxyError::Upstream.into_response()));
        }

        // 206 for ranged requests, 200 otherwise
        let status = if status == StatusCode::PARTIAL_CONTENT {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        };

        let mut builder = with_cors(Response::builder().status(status));
        if !content_type.is_empty() {
            builder = builder.header(header::CONTENT_TYPE, content_type.as_str());
        }
        for name in FORWARDED_HEADERS {
            if let Some(value) = upstream.headers().get(name) {
                builder = builder.header(name, value.clone());
            }
        }

        tracing::debug!(%url, %status, "Streaming proxied response");
        let source = url.to_string();
        let body = upstream.bytes_stream().inspect_err(move |e| {
            tracing::warn!(url = %source, "Upstream stream interrupted: {}", e);
        });
        Ok(builder
            .body(Body::from_stream(body))
            .unwrap_or_else(|_| ProxyError::Upstream.into_response()))
    }

    /// Relay a subtitle file, converting it to WebVTT
    pub async fn relay_subtitle(&self, url: Option<&str>) -> Result<Response, ProxyError> {
        let url = validate_url(url)?;

        let upstream = self.upstream_request(url).send().await.map_err(|e| {
            tracing::error!(%url, "Error proxying subtitle: {}", e);
            ProxyError::SubtitleUpstream
        })?;

        if !upstream.status().is_success() {
            tracing::error!(%url, status = %upstream.status(), "Error proxying subtitle");
            return Err(ProxyError::SubtitleUpstream);
        }

        let text = upstream.text().await.map_err(|e| {
            tracing::error!(%url, "Error reading subtitle: {}", e);
            ProxyError::SubtitleUpstream
        })?;

        Ok(with_cors(Response::builder().status(StatusCode::OK))
            .header(header::CONTENT_TYPE, subtitles::WEBVTT_CONTENT_TYPE)
            .body(Body::from(subtitles::to_webvtt(&text)))
            .unwrap_or_else(|_| ProxyError::SubtitleUpstream.into_response()))
    }

    fn upstream_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header(header::REFERER, self.headers.referer.as_str())
            .header(header::USER_AGENT, self.headers.user_agent.as_str())
            .header(header::ORIGIN, self.headers.origin.as_str())
    }
}

/// Preflight response for `OPTIONS` on the relay routes
pub fn preflight() -> Response {
    with_cors(Response::builder().status(StatusCode::NO_CONTENT))
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::NO_CONTENT.into_response())
}

fn with_cors(builder: axum::http::response::Builder) -> axum::http::response::Builder {
    builder
        .header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        )
        .header(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        )
        .header(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        )
}

fn validate_url(url: Option<&str>) -> Result<&str, ProxyError> {
    let url = url.map(str::trim).filter(|u| !u.is_empty()).ok_or(ProxyError::MissingUrl)?;
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
        _ => Err(ProxyError::UnsupportedScheme),
    }
}

fn is_playlist(content_type: &str, url: &str) -> bool {
    if content_type.to_ascii_lowercase().contains("mpegurl") {
        return true;
    }
    url::Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase().ends_with(".m3u8"))
        .unwrap_or(false)
}

// ------------------------------------------------------------------
// M3U8 rewriting helpers
// ------------------------------------------------------------------

/// Rewrite URLs inside an M3U8 playlist so they proxy through the relay
pub fn rewrite_playlist(m3u8: &str, source_url: &str, routes: &ProxyRoutes) -> String {
    let base = url::Url::parse(source_url).ok();
    let mut output = String::with_capacity(m3u8.len());

    for line in m3u8.lines() {
        if line.starts_with('#') {
            output.push_str(&rewrite_uri_attribute(line, base.as_ref(), routes));
        } else {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                output.push_str(line);
            } else {
                let absolute = make_absolute(trimmed, base.as_ref());
                output.push_str(&routes.video_url(&absolute));
            }
        }
        output.push('\n');
    }

    output
}

/// Resolve a possibly-relative URL against the playlist URL
fn make_absolute(raw: &str, base: Option<&url::Url>) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }
    base.and_then(|b| b.join(raw).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Rewrite any `URI="..."` values found in a tag line (keys, maps, media)
fn rewrite_uri_attribute(line: &str, base: Option<&url::Url>, routes: &ProxyRoutes) -> String {
    let pattern = "URI=\"";
    let mut result = String::with_capacity(line.len());
    let mut remaining = line;

    while let Some(start) = remaining.find(pattern) {
        result.push_str(&remaining[..start + pattern.len()]);
        remaining = &remaining[start + pattern.len()..];

        if let Some(end) = remaining.find('"') {
            let absolute = make_absolute(&remaining[..end], base);
            result.push_str(&routes.video_url(&absolute));
            result.push('"');
            remaining = &remaining[end + 1..];
        } else {
            result.push_str(remaining);
            remaining = "";
        }
    }

    result.push_str(remaining);
    result
}
