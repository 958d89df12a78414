//! cinedeck - movie and TV discovery backend with a same-origin streaming relay
//!
//! Serves TMDB catalog data and plays video by delegating to external embed
//! providers through a thin proxy that dodges cross-origin and referer
//! restrictions.
//!
//! # Modules
//!
//! - `models` - Data structures for catalog entries, providers, watchlist
//! - `api` - API clients (TMDB, embed sources)
//! - `catalog` - Card normalization, genres, image URLs
//! - `stream` - Source negotiation, proxy relay, subtitle conversion
//! - `watchlist` - Local JSON watchlist
//! - `server` - axum HTTP service
//! - `cli` / `commands` - Scriptable command line

pub mod api;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod server;
pub mod stream;
pub mod watchlist;

// Re-export commonly used types
pub use models::{
    Episode, Genre, MediaCard, MediaSummary, MediaType, MovieDetail, Page, ProviderSource,
    Quality, TvDetail, VideoFile, WatchlistItem,
};

pub use api::{SourcesClient, TmdbClient};
pub use config::Config;
pub use server::{build_router, AppState};
pub use stream::{ProxyRelay, SourceNegotiator};
pub use watchlist::Watchlist;
