//! API clients for external services
//!
//! - TMDB: Movie/TV catalog, metadata and search
//! - Sources: Streaming providers from the embed API

pub mod sources;
pub mod tmdb;

pub use sources::{SourceRequest, SourcesClient, SourcesError};
pub use tmdb::{TmdbClient, TmdbError};
