//! Data structures and types for cinedeck
//!
//! Contains all shared models used across the application organized by domain:
//! - **Catalog**: TMDB listings, details, seasons and normalized cards
//! - **Sources**: Provider entries with quality variants and subtitle tracks
//! - **Watchlist**: Locally saved movies and TV shows

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Catalog Models (TMDB)
// =============================================================================

/// Media type discriminator for catalog entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by TMDB and the sources API
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "Movie"),
            MediaType::Tv => write!(f, "TV Show"),
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaType::Movie),
            "tv" | "series" | "show" => Ok(MediaType::Tv),
            other => Err(format!("Unknown media type: {}", other)),
        }
    }
}

/// What the trending endpoint should include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingScope {
    #[default]
    All,
    Movie,
    Tv,
}

impl TrendingScope {
    pub fn as_path(&self) -> &'static str {
        match self {
            TrendingScope::All => "all",
            TrendingScope::Movie => "movie",
            TrendingScope::Tv => "tv",
        }
    }
}

impl FromStr for TrendingScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(TrendingScope::All),
            other => other
                .parse::<MediaType>()
                .map(|media| match media {
                    MediaType::Movie => TrendingScope::Movie,
                    MediaType::Tv => TrendingScope::Tv,
                })
                .map_err(|_| format!("Unknown trending scope: {}", other)),
        }
    }
}

/// Trending time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    #[default]
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_path(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            other => Err(format!("Unknown time window: {}", other)),
        }
    }
}

/// One page of a paginated TMDB listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// An empty first page
    pub fn empty() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            total_results: 0,
            results: Vec::new(),
        }
    }

    /// Transform the rows while keeping pagination info
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            total_pages: self.total_pages,
            total_results: self.total_results,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// A single catalog row (listing, trending, search or "similar" entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: f32,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl fmt::Display for MediaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_str = self
            .release_date
            .as_deref()
            .and_then(extract_year)
            .map(|y| format!(" ({})", y))
            .unwrap_or_default();
        write!(f, "{}{} [{}]", self.title, year_str, self.media_type)
    }
}

/// Genre as listed by TMDB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

impl Credits {
    /// First crew member credited as director
    pub fn director(&self) -> Option<&str> {
        self.crew
            .iter()
            .find(|member| member.job == "Director")
            .map(|member| member.name.as_str())
    }
}

/// Trailer, teaser or clip attached to a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoClip {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl VideoClip {
    /// Watch URL for clips hosted on YouTube
    pub fn youtube_url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

/// Summary of a TV season (used in TvDetail)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u16,
    pub episode_count: u16,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub air_date: Option<String>,
}

impl fmt::Display for SeasonSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("Season");
        write!(
            f,
            "{} {} ({} episodes)",
            name, self.season_number, self.episode_count
        )
    }
}

/// Detailed movie information from TMDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: u64,
    pub imdb_id: Option<String>,
    pub title: String,
    pub overview: String,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub genres: Vec<Genre>,
    pub vote_average: f32,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub credits: Credits,
    pub videos: Vec<VideoClip>,
    pub similar: Vec<MediaSummary>,
}

impl fmt::Display for MovieDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self
            .release_date
            .as_deref()
            .and_then(extract_year)
            .unwrap_or(0);
        let runtime = self.runtime.unwrap_or(0);
        write!(
            f,
            "{} ({}) - {}h {}m - ⭐ {:.1}",
            self.title,
            year,
            runtime / 60,
            runtime % 60,
            self.vote_average
        )
    }
}

/// Detailed TV show information from TMDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvDetail {
    pub id: u64,
    pub imdb_id: Option<String>,
    pub name: String,
    pub overview: String,
    pub first_air_date: Option<String>,
    pub number_of_seasons: u16,
    pub number_of_episodes: u32,
    pub episode_run_time: Vec<u32>,
    pub seasons: Vec<SeasonSummary>,
    pub genres: Vec<Genre>,
    pub vote_average: f32,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub credits: Credits,
    pub videos: Vec<VideoClip>,
    pub similar: Vec<MediaSummary>,
}

impl TvDetail {
    /// Episode count of a season, if the season exists
    pub fn episode_count(&self, season: u16) -> Option<u16> {
        self.seasons
            .iter()
            .find(|s| s.season_number == season)
            .map(|s| s.episode_count)
    }
}

impl fmt::Display for TvDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self
            .first_air_date
            .as_deref()
            .and_then(extract_year)
            .unwrap_or(0);
        write!(
            f,
            "{} ({}) - {} seasons - ⭐ {:.1}",
            self.name,
            year,
            self.seasons.len(),
            self.vote_average
        )
    }
}

/// TV episode information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub season: u16,
    pub episode: u16,
    pub name: String,
    pub overview: String,
    pub still_path: Option<String>,
    pub vote_average: f32,
    pub runtime: Option<u32>,
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02} - {}", self.season, self.episode, self.name)
    }
}

/// Normalized card shown in every listing and detail header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaCard {
    pub id: String,
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: f32,
    pub runtime: Option<u32>,
    pub genre_ids: Vec<u32>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub year: u16,
    pub rating: f32,
    pub duration: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub director: String,
}

// =============================================================================
// Source Models (embed providers)
// =============================================================================

/// Delivery format of a provider file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Hls,
    Mp4,
    #[serde(other)]
    Other,
}

impl StreamKind {
    pub fn is_hls(&self) -> bool {
        matches!(self, StreamKind::Hls)
    }
}

/// One quality variant offered by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    pub file: String,
    #[serde(rename = "type")]
    pub kind: StreamKind,
    pub quality: String,
    #[serde(default)]
    pub lang: String,
}

impl VideoFile {
    /// Loose quality classification of this file's label
    pub fn classified_quality(&self) -> Quality {
        Quality::from_str_loose(&self.quality)
    }
}

/// Subtitle track offered by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub lang: String,
}

/// A streaming provider with its quality variants and subtitle tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSource {
    pub provider: String,
    #[serde(default)]
    pub files: Vec<VideoFile>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleTrack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl ProviderSource {
    /// Quality labels in provider order
    pub fn qualities(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.quality.as_str()).collect()
    }
}

impl fmt::Display for ProviderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} subtitle(s)",
            self.provider,
            self.qualities().join(", "),
            self.subtitles.len()
        )
    }
}

/// Video quality classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Quality {
    UHD4K,
    FHD1080p,
    HD720p,
    SD480p,
    LD360p,
    #[default]
    Unknown,
}

impl Quality {
    /// Parse quality from a label (e.g., "4K", "1080p", "720", "auto")
    pub fn from_str_loose(s: &str) -> Self {
        let s_lower = s.to_lowercase();
        if s_lower.contains("4k") || s_lower.contains("2160") || s_lower.contains("uhd") {
            return Quality::UHD4K;
        }
        if s_lower.contains("fhd") {
            return Quality::FHD1080p;
        }

        // Bare heights like "1080", "720p" or "480P"
        let re = regex::Regex::new(r"(\d{3,4})\s*p?").ok();
        if let Some(height) = re
            .and_then(|re| re.captures(&s_lower))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            return match height {
                h if h >= 2000 => Quality::UHD4K,
                h if h >= 1000 => Quality::FHD1080p,
                h if h >= 700 => Quality::HD720p,
                h if h >= 480 => Quality::SD480p,
                h if h >= 300 => Quality::LD360p,
                _ => Quality::Unknown,
            };
        }

        if s_lower.contains("hd") && !s_lower.contains("hdcam") {
            Quality::HD720p
        } else if s_lower.contains("sd") {
            Quality::SD480p
        } else {
            Quality::Unknown
        }
    }

    /// Quality ranking for sorting (higher = better)
    pub fn rank(&self) -> u8 {
        match self {
            Quality::UHD4K => 5,
            Quality::FHD1080p => 4,
            Quality::HD720p => 3,
            Quality::SD480p => 2,
            Quality::LD360p => 1,
            Quality::Unknown => 0,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::UHD4K => write!(f, "4K"),
            Quality::FHD1080p => write!(f, "1080p"),
            Quality::HD720p => write!(f, "720p"),
            Quality::SD480p => write!(f, "480p"),
            Quality::LD360p => write!(f, "360p"),
            Quality::Unknown => write!(f, "???"),
        }
    }
}

impl Ord for Quality {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// =============================================================================
// Watchlist Models
// =============================================================================

/// A title saved to the local watchlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    pub media_type: MediaType,
}

impl From<&MediaCard> for WatchlistItem {
    fn from(card: &MediaCard) -> Self {
        let (release_date, first_air_date) = match card.media_type {
            MediaType::Movie => (card.release_date.clone(), None),
            MediaType::Tv => (None, card.release_date.clone()),
        };
        Self {
            id: card.id.clone(),
            title: card.title.clone(),
            poster_path: card.poster_path.clone(),
            vote_average: card.vote_average,
            release_date,
            first_air_date,
            media_type: card.media_type,
        }
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Extract year from a date string like "2022-03-04"
pub fn extract_year(date: &str) -> Option<u16> {
    if date.len() >= 4 {
        date.get(..4)?.parse().ok()
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
