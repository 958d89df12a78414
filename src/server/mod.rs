//! HTTP service
//!
//! JSON catalog endpoints, source negotiation, the local watchlist and the
//! same-origin media relay, all over one shared `AppState`.

use anyhow::{Context, Result};
use axum::{
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::{SourcesClient, TmdbClient};
use crate::config::Config;
use crate::models::Quality;
use crate::stream::{ProxyRelay, ProxyRoutes};
use crate::watchlist::Watchlist;

pub mod catalog;
pub mod error;
pub mod playback;
pub mod watchlist;

pub use error::{ApiError, ApiResult};

/// Shared state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub tmdb: TmdbClient,
    pub sources: SourcesClient,
    pub relay: ProxyRelay,
    pub watchlist: Arc<Mutex<Watchlist>>,
    /// Used when a play request names no quality
    pub preferred_quality: Option<Quality>,
}

impl AppState {
    pub fn new(
        tmdb: TmdbClient,
        sources: SourcesClient,
        relay: ProxyRelay,
        watchlist: Watchlist,
    ) -> Self {
        Self {
            tmdb,
            sources,
            relay,
            watchlist: Arc::new(Mutex::new(watchlist)),
            preferred_quality: None,
        }
    }

    pub fn with_preferred_quality(mut self, quality: Option<Quality>) -> Self {
        self.preferred_quality = quality;
        self
    }

    /// Build every client from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let tmdb = TmdbClient::with_base_url(config.tmdb_api_key()?, config.tmdb_base_url())
            .with_language(config.language());
        let sources = SourcesClient::new(config.sources_api_url.clone());
        if !sources.is_configured() {
            tracing::warn!("Sources API URL is not configured, playback endpoints will fail");
        }

        let relay = ProxyRelay::new(
            config.proxy.upstream_headers(),
            ProxyRoutes::default(),
            config.proxy.rewrite_playlists,
        );

        let watchlist_path = config
            .watchlist_path()
            .context("Could not determine watchlist location")?;

        let watchlist = Watchlist::open(watchlist_path);
        tracing::info!(path = %watchlist.path().display(), "Using watchlist file");

        Ok(Self::new(tmdb, sources, relay, watchlist)
            .with_preferred_quality(config.preferred_quality()))
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the application router
///
/// The relay routes answer their own CORS preflight, so the permissive CORS
/// layer only wraps the JSON API.
pub fn build_router(state: AppState) -> Router {
    let api: Router<AppState> = Router::new()
        .route("/health", get(health))
        // Catalog
        .route("/api/catalog/popular", get(catalog::popular))
        .route("/api/catalog/top-rated", get(catalog::top_rated))
        .route("/api/catalog/trending", get(catalog::trending))
        .route("/api/catalog/genres", get(catalog::genres))
        .route("/api/catalog/genre/:slug", get(catalog::genre))
        .route("/api/catalog/search", get(catalog::search))
        // Details
        .route("/api/movie/:id", get(catalog::movie))
        .route("/api/tv/:id", get(catalog::tv))
        .route("/api/tv/:id/season/:season", get(catalog::season))
        // Sources and playback
        .route("/api/sources/movie/:id", get(playback::movie_sources))
        .route("/api/sources/tv/:id", get(playback::tv_sources))
        .route("/api/play/movie/:id", get(playback::play_movie))
        .route("/api/play/tv/:id", get(playback::play_tv))
        // Watchlist
        .route("/api/watchlist", get(watchlist::list).post(watchlist::add))
        .route(
            "/api/watchlist/:media_type/:id",
            get(watchlist::check).delete(watchlist::remove),
        )
        .layer(CorsLayer::permissive());

    let relay: Router<AppState> = Router::new()
        .route(
            "/api/video",
            get(playback::proxy_video).options(playback::proxy_preflight),
        )
        .route("/api/subtitle", get(playback::proxy_subtitle));

    Router::new()
        .merge(api)
        .merge(relay)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    tracing::info!("Starting HTTP server on {}", bind);

    axum::serve(listener, build_router(state))
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_uses_configured_watchlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let config = Config {
            tmdb_api_key: Some("key".to_string()),
            watchlist_path: Some(path.clone()),
            preferred_quality: Some("720p".to_string()),
            ..Config::default()
        };

        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.watchlist.lock().await.path(), path.as_path());
        assert_eq!(state.preferred_quality, Some(Quality::HD720p));
        assert!(!state.sources.is_configured());
    }

    #[test]
    fn test_from_config_requires_tmdb_key() {
        assert!(AppState::from_config(&Config::default()).is_err());
    }
}
