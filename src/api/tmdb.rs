//! TMDB (The Movie Database) API client
//!
//! Provides catalog listings, search and metadata for movies and TV shows.
//! API docs: https://developer.themoviedb.org/docs

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    CastMember, Credits, CrewMember, Episode, Genre, MediaSummary, MediaType, MovieDetail, Page,
    SeasonSummary, TimeWindow, TrendingScope, TvDetail, VideoClip,
};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Queries shorter than this return an empty page without a request
pub const MIN_QUERY_LEN: usize = 2;

const APPEND_TO_RESPONSE: &str = "credits,videos,similar,external_ids";

/// TMDB API error types
#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Rate limited (429), retries exhausted")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, TmdbError>;

/// TMDB API client
#[derive(Clone)]
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    language: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl TmdbClient {
    /// Create a new TMDB client with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            max_retries: 3,
        }
    }

    /// Override the response language (default "en-US")
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Make an authenticated GET request with retry logic for rate limits
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut retries = 0;

        loop {
            tracing::debug!(endpoint, "TMDB request");
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("api_key", self.api_key.as_str()),
                    ("language", self.language.as_str()),
                ])
                .query(params)
                .header("Accept", "application/json")
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await?;
                    let parsed: T = serde_json::from_str(&body).map_err(|e| {
                        TmdbError::InvalidResponse(format!("JSON parse error: {}", e))
                    })?;
                    return Ok(parsed);
                }
                StatusCode::NOT_FOUND => {
                    return Err(TmdbError::NotFound);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    retries += 1;
                    if retries >= self.max_retries {
                        return Err(TmdbError::RateLimited);
                    }

                    // Get Retry-After header or default to exponential backoff
                    let wait_secs = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(2u64.pow(retries));

                    tracing::warn!(endpoint, wait_secs, "TMDB rate limited, backing off");
                    tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                    continue;
                }
                status => {
                    return Err(TmdbError::ServerError(status.as_u16()));
                }
            }
        }
    }

    /// Popular movies or TV shows
    pub async fn popular(&self, media: MediaType, page: u32) -> Result<Page<MediaSummary>> {
        let endpoint = format!("/{}/popular", media.as_path());
        let response: ListResponse = self.get(&endpoint, &[("page", page.to_string())]).await?;
        Ok(response.into_page(Some(media)))
    }

    /// Top rated movies or TV shows
    pub async fn top_rated(&self, media: MediaType, page: u32) -> Result<Page<MediaSummary>> {
        let endpoint = format!("/{}/top_rated", media.as_path());
        let response: ListResponse = self.get(&endpoint, &[("page", page.to_string())]).await?;
        Ok(response.into_page(Some(media)))
    }

    /// Trending content for a scope and time window
    pub async fn trending(
        &self,
        scope: TrendingScope,
        window: TimeWindow,
    ) -> Result<Page<MediaSummary>> {
        let endpoint = format!("/trending/{}/{}", scope.as_path(), window.as_path());
        let response: ListResponse = self.get(&endpoint, &[]).await?;
        let fallback = match scope {
            TrendingScope::All => None,
            TrendingScope::Movie => Some(MediaType::Movie),
            TrendingScope::Tv => Some(MediaType::Tv),
        };
        Ok(response.into_page(fallback))
    }

    /// Official genre list
    pub async fn genres(&self, media: MediaType) -> Result<Vec<Genre>> {
        let endpoint = format!("/genre/{}/list", media.as_path());
        let response: GenreListResponse = self.get(&endpoint, &[]).await?;
        Ok(response.genres)
    }

    /// Movies in a genre, most popular first
    pub async fn discover_by_genre(&self, genre_id: u32, page: u32) -> Result<Page<MediaSummary>> {
        let params = [
            ("with_genres", genre_id.to_string()),
            ("page", page.to_string()),
            ("sort_by", "popularity.desc".to_string()),
        ];
        let response: ListResponse = self.get("/discover/movie", &params).await?;
        Ok(response.into_page(Some(MediaType::Movie)))
    }

    /// Search for movies and TV shows
    pub async fn search(&self, query: &str, page: u32) -> Result<Page<MediaSummary>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Page::empty());
        }

        let params = [("query", query.to_string()), ("page", page.to_string())];
        let response: ListResponse = self.get("/search/multi", &params).await?;
        Ok(response.into_page(None))
    }

    /// Get movie details with credits, videos and similar titles
    pub async fn movie_detail(&self, id: u64) -> Result<MovieDetail> {
        let endpoint = format!("/movie/{}", id);
        let params = [("append_to_response", APPEND_TO_RESPONSE.to_string())];
        let response: MovieResponse = self.get(&endpoint, &params).await?;
        Ok(response.into_detail())
    }

    /// Get TV show details with credits, videos and similar titles
    pub async fn tv_detail(&self, id: u64) -> Result<TvDetail> {
        let endpoint = format!("/tv/{}", id);
        let params = [("append_to_response", APPEND_TO_RESPONSE.to_string())];
        let response: TvResponse = self.get(&endpoint, &params).await?;
        Ok(response.into_detail())
    }

    /// Get episodes for a TV season
    pub async fn tv_season(&self, id: u64, season: u16) -> Result<Vec<Episode>> {
        let endpoint = format!("/tv/{}/season/{}", id, season);
        let response: SeasonResponse = self.get(&endpoint, &[]).await?;
        Ok(response.into_episodes(season))
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListResponse {
    page: Option<u32>,
    total_pages: Option<u32>,
    total_results: Option<u32>,
    #[serde(default)]
    results: Vec<SummaryRaw>,
}

impl ListResponse {
    fn into_page(self, fallback: Option<MediaType>) -> Page<MediaSummary> {
        Page {
            page: self.page.unwrap_or(1),
            total_pages: self.total_pages.unwrap_or(1),
            total_results: self.total_results.unwrap_or(0),
            results: summaries(self.results, fallback),
        }
    }
}

fn summaries(rows: Vec<SummaryRaw>, fallback: Option<MediaType>) -> Vec<MediaSummary> {
    rows.into_iter()
        .filter_map(|r| r.into_summary(fallback))
        .collect()
}

#[derive(Debug, Deserialize)]
struct SummaryRaw {
    id: u64,
    media_type: Option<String>,
    // Movies use "title", TV uses "name"
    title: Option<String>,
    name: Option<String>,
    // Movies use "release_date", TV uses "first_air_date"
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    #[serde(default)]
    genre_ids: Vec<u32>,
}

impl SummaryRaw {
    fn into_summary(self, fallback: Option<MediaType>) -> Option<MediaSummary> {
        let media_type = match self.media_type.as_deref() {
            Some("movie") => MediaType::Movie,
            Some("tv") => MediaType::Tv,
            // Filter out "person" and other types
            Some(_) => return None,
            None => match fallback {
                Some(media) => media,
                None if self.title.is_some() => MediaType::Movie,
                None => MediaType::Tv,
            },
        };

        let (title, date) = match media_type {
            MediaType::Movie => (self.title.or(self.name), self.release_date),
            MediaType::Tv => (self.name.or(self.title), self.first_air_date),
        };

        Some(MediaSummary {
            id: self.id,
            media_type,
            title: title.unwrap_or_default(),
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date: date.filter(|d| !d.is_empty()),
            vote_average: self.vote_average.unwrap_or(0.0),
            genre_ids: self.genre_ids,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Default, Deserialize)]
struct CreditsRaw {
    #[serde(default)]
    cast: Vec<CastMember>,
    #[serde(default)]
    crew: Vec<CrewMember>,
}

impl CreditsRaw {
    fn into_credits(self) -> Credits {
        Credits {
            cast: self.cast,
            crew: self.crew,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideosRaw {
    #[serde(default)]
    results: Vec<VideoClip>,
}

#[derive(Debug, Deserialize)]
struct SimilarRaw {
    #[serde(default)]
    results: Vec<SummaryRaw>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieResponse {
    id: u64,
    imdb_id: Option<String>,
    title: String,
    release_date: Option<String>,
    runtime: Option<u32>,
    #[serde(default)]
    genres: Vec<Genre>,
    overview: Option<String>,
    vote_average: Option<f32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    credits: Option<CreditsRaw>,
    videos: Option<VideosRaw>,
    similar: Option<SimilarRaw>,
    external_ids: Option<ExternalIds>,
}

impl MovieResponse {
    fn into_detail(self) -> MovieDetail {
        let imdb_id = self
            .imdb_id
            .or_else(|| self.external_ids.and_then(|e| e.imdb_id))
            .filter(|id| !id.is_empty());

        MovieDetail {
            id: self.id,
            imdb_id,
            title: self.title,
            overview: self.overview.unwrap_or_default(),
            release_date: self.release_date.filter(|d| !d.is_empty()),
            runtime: self.runtime,
            genres: self.genres,
            vote_average: self.vote_average.unwrap_or(0.0),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            credits: self.credits.unwrap_or_default().into_credits(),
            videos: self.videos.map(|v| v.results).unwrap_or_default(),
            similar: self
                .similar
                .map(|s| summaries(s.results, Some(MediaType::Movie)))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TvResponse {
    id: u64,
    name: String,
    first_air_date: Option<String>,
    number_of_seasons: Option<u16>,
    number_of_episodes: Option<u32>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    #[serde(default)]
    seasons: Vec<SeasonRaw>,
    #[serde(default)]
    genres: Vec<Genre>,
    overview: Option<String>,
    vote_average: Option<f32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    credits: Option<CreditsRaw>,
    videos: Option<VideosRaw>,
    similar: Option<SimilarRaw>,
    external_ids: Option<ExternalIds>,
}

impl TvResponse {
    fn into_detail(self) -> TvDetail {
        let imdb_id = self
            .external_ids
            .and_then(|e| e.imdb_id)
            .filter(|id| !id.is_empty());

        // Filter out specials (season 0)
        let seasons: Vec<SeasonSummary> = self
            .seasons
            .into_iter()
            .filter(|s| s.season_number > 0)
            .map(|s| s.into_summary())
            .collect();

        TvDetail {
            id: self.id,
            imdb_id,
            name: self.name,
            overview: self.overview.unwrap_or_default(),
            first_air_date: self.first_air_date.filter(|d| !d.is_empty()),
            number_of_seasons: self.number_of_seasons.unwrap_or(seasons.len() as u16),
            number_of_episodes: self.number_of_episodes.unwrap_or(0),
            episode_run_time: self.episode_run_time,
            seasons,
            genres: self.genres,
            vote_average: self.vote_average.unwrap_or(0.0),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            credits: self.credits.unwrap_or_default().into_credits(),
            videos: self.videos.map(|v| v.results).unwrap_or_default(),
            similar: self
                .similar
                .map(|s| summaries(s.results, Some(MediaType::Tv)))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeasonRaw {
    season_number: u16,
    #[serde(default)]
    episode_count: u16,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    air_date: Option<String>,
}

impl SeasonRaw {
    fn into_summary(self) -> SeasonSummary {
        SeasonSummary {
            season_number: self.season_number,
            episode_count: self.episode_count,
            name: self.name,
            overview: self.overview.filter(|o| !o.is_empty()),
            poster_path: self.poster_path,
            air_date: self.air_date,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeasonResponse {
    #[serde(default)]
    episodes: Vec<EpisodeRaw>,
}

impl SeasonResponse {
    fn into_episodes(self, season: u16) -> Vec<Episode> {
        self.episodes
            .into_iter()
            .map(|e| e.into_episode(season))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct EpisodeRaw {
    episode_number: u16,
    name: String,
    overview: Option<String>,
    still_path: Option<String>,
    vote_average: Option<f32>,
    runtime: Option<u32>,
}

impl EpisodeRaw {
    fn into_episode(self, season: u16) -> Episode {
        Episode {
            season,
            episode: self.episode_number,
            name: self.name,
            overview: self.overview.unwrap_or_default(),
            still_path: self.still_path,
            vote_average: self.vote_average.unwrap_or(0.0),
            runtime: self.runtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(media_type: Option<&str>, title: Option<&str>, name: Option<&str>) -> SummaryRaw {
        SummaryRaw {
            id: 1,
            media_type: media_type.map(str::to_string),
            title: title.map(str::to_string),
            name: name.map(str::to_string),
            release_date: Some("2022-01-01".to_string()),
            first_air_date: Some("2019-05-05".to_string()),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            vote_average: None,
            genre_ids: vec![],
        }
    }

    #[test]
    fn test_media_type_filter() {
        assert!(raw(Some("movie"), Some("Test"), None).into_summary(None).is_some());
        assert!(raw(Some("person"), None, Some("Actor")).into_summary(None).is_none());
    }

    #[test]
    fn test_missing_media_type_uses_fallback() {
        let row = raw(None, None, Some("Show")).into_summary(Some(MediaType::Tv)).unwrap();
        assert_eq!(row.media_type, MediaType::Tv);
        assert_eq!(row.title, "Show");
        assert_eq!(row.release_date.as_deref(), Some("2019-05-05"));
    }

    #[test]
    fn test_missing_media_type_guesses_from_title() {
        let row = raw(None, Some("Film"), None).into_summary(None).unwrap();
        assert_eq!(row.media_type, MediaType::Movie);
        assert_eq!(row.release_date.as_deref(), Some("2022-01-01"));
    }

    #[tokio::test]
    async fn test_short_query_skips_request() {
        // Unroutable base URL: any request would fail
        let client = TmdbClient::with_base_url("key", "http://127.0.0.1:9");
        let page = client.search(" a ", 1).await.unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.page, 1);
    }
}
