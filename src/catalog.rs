//! Catalog normalization
//!
//! Turns TMDB rows and details into the `MediaCard` shape every listing uses,
//! plus the small helpers around it (image URLs, runtimes, genre lookups).

use crate::models::{
    extract_year, Credits, Genre, MediaSummary, MediaType, MovieDetail, TvDetail,
};

pub use crate::models::MediaCard;

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Fixed TMDB movie genre table, used when a row only carries genre ids
const GENRES: &[(u32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// Requested image width bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Small,
    Medium,
    Large,
    Original,
}

/// Image role; posters and backdrops use different width buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Poster,
    Backdrop,
}

/// Full image URL for a TMDB path, `None` when the path is absent or empty
pub fn image_url(path: Option<&str>, size: ImageSize, kind: ImageKind) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    let bucket = match (kind, size) {
        (ImageKind::Poster, ImageSize::Small) => "w185",
        (ImageKind::Poster, ImageSize::Medium) => "w342",
        (ImageKind::Poster, ImageSize::Large) => "w500",
        (ImageKind::Backdrop, ImageSize::Small) => "w300",
        (ImageKind::Backdrop, ImageSize::Medium) => "w780",
        (ImageKind::Backdrop, ImageSize::Large) => "w1280",
        (_, ImageSize::Original) => "original",
    };
    Some(format!("{}{}{}", IMAGE_BASE_URL, bucket, path))
}

/// Format runtime minutes as "2h 5m" / "45m"; zero formats as empty
pub fn format_runtime(minutes: u32) -> String {
    if minutes == 0 {
        return String::new();
    }
    let hours = minutes / 60;
    let remaining = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, remaining)
    } else {
        format!("{}m", remaining)
    }
}

/// Genre name from the fixed table
pub fn genre_name(id: u32) -> String {
    GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Genre {}", id))
}

/// Find a genre by URL slug ("action", "science-fiction") or numeric id
pub fn resolve_genre<'a>(genres: &'a [Genre], slug: &str) -> Option<&'a Genre> {
    if let Ok(id) = slug.parse::<u32>() {
        return genres.iter().find(|g| g.id == id);
    }
    let wanted = normalize_slug(slug);
    genres.iter().find(|g| normalize_slug(&g.name) == wanted)
}

/// URL slug for a genre name
pub fn genre_slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

fn normalize_slug(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', '_'], " ")
}

fn rounded_rating(vote_average: f32) -> f32 {
    (vote_average * 10.0).round() / 10.0
}

fn duration_label(runtime: Option<u32>) -> String {
    match runtime {
        Some(minutes) if minutes > 0 => format_runtime(minutes),
        _ => "N/A".to_string(),
    }
}

fn cast_names(credits: &Credits) -> Vec<String> {
    credits.cast.iter().take(5).map(|c| c.name.clone()).collect()
}

fn director_name(credits: &Credits) -> String {
    credits.director().unwrap_or("Unknown").to_string()
}

struct CardParts<'a> {
    id: u64,
    media_type: MediaType,
    title: &'a str,
    overview: &'a str,
    poster_path: Option<&'a str>,
    backdrop_path: Option<&'a str>,
    release_date: Option<&'a str>,
    vote_average: f32,
    runtime: Option<u32>,
    genre_ids: Vec<u32>,
    genres: Vec<String>,
    credits: Option<&'a Credits>,
}

impl CardParts<'_> {
    fn build(self) -> MediaCard {
        let year = self.release_date.and_then(extract_year).unwrap_or(0);
        let genres = if self.genres.is_empty() {
            self.genre_ids.iter().map(|id| genre_name(*id)).collect()
        } else {
            self.genres
        };

        MediaCard {
            id: self.id.to_string(),
            media_type: self.media_type,
            title: self.title.to_string(),
            overview: self.overview.to_string(),
            poster_path: self.poster_path.map(str::to_string),
            backdrop_path: self.backdrop_path.map(str::to_string),
            release_date: self.release_date.map(str::to_string),
            vote_average: self.vote_average,
            runtime: self.runtime,
            poster_url: image_url(self.poster_path, ImageSize::Large, ImageKind::Poster),
            backdrop_url: image_url(self.backdrop_path, ImageSize::Large, ImageKind::Backdrop),
            genre_ids: self.genre_ids,
            year,
            rating: rounded_rating(self.vote_average),
            duration: duration_label(self.runtime),
            genres,
            cast: self.credits.map(cast_names).unwrap_or_default(),
            director: self
                .credits
                .map(director_name)
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

impl MediaCard {
    /// Card for a listing row (no credits, no runtime)
    pub fn from_summary(item: &MediaSummary) -> Self {
        CardParts {
            id: item.id,
            media_type: item.media_type,
            title: &item.title,
            overview: &item.overview,
            poster_path: item.poster_path.as_deref(),
            backdrop_path: item.backdrop_path.as_deref(),
            release_date: item.release_date.as_deref(),
            vote_average: item.vote_average,
            runtime: None,
            genre_ids: item.genre_ids.clone(),
            genres: Vec::new(),
            credits: None,
        }
        .build()
    }

    pub fn from_movie(detail: &MovieDetail) -> Self {
        CardParts {
            id: detail.id,
            media_type: MediaType::Movie,
            title: &detail.title,
            overview: &detail.overview,
            poster_path: detail.poster_path.as_deref(),
            backdrop_path: detail.backdrop_path.as_deref(),
            release_date: detail.release_date.as_deref(),
            vote_average: detail.vote_average,
            runtime: detail.runtime,
            genre_ids: detail.genres.iter().map(|g| g.id).collect(),
            genres: detail.genres.iter().map(|g| g.name.clone()).collect(),
            credits: Some(&detail.credits),
        }
        .build()
    }

    /// Card for a show; duration comes from the first episode run time
    pub fn from_tv(detail: &TvDetail) -> Self {
        CardParts {
            id: detail.id,
            media_type: MediaType::Tv,
            title: &detail.name,
            overview: &detail.overview,
            poster_path: detail.poster_path.as_deref(),
            backdrop_path: detail.backdrop_path.as_deref(),
            release_date: detail.first_air_date.as_deref(),
            vote_average: detail.vote_average,
            runtime: detail.episode_run_time.first().copied(),
            genre_ids: detail.genres.iter().map(|g| g.id).collect(),
            genres: detail.genres.iter().map(|g| g.name.clone()).collect(),
            credits: Some(&detail.credits),
        }
        .build()
    }
}

/// Batch convert listing rows
pub fn cards(items: &[MediaSummary]) -> Vec<MediaCard> {
    items.iter().map(MediaCard::from_summary).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(0), "");
        assert_eq!(format_runtime(45), "45m");
        assert_eq!(format_runtime(60), "1h 0m");
        assert_eq!(format_runtime(176), "2h 56m");
    }

    #[test]
    fn test_image_url_sizes() {
        assert_eq!(
            image_url(Some("/a.jpg"), ImageSize::Large, ImageKind::Poster).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/a.jpg")
        );
        assert_eq!(
            image_url(Some("/b.jpg"), ImageSize::Medium, ImageKind::Backdrop).as_deref(),
            Some("https://image.tmdb.org/t/p/w780/b.jpg")
        );
        assert_eq!(
            image_url(Some("/c.jpg"), ImageSize::Original, ImageKind::Backdrop).as_deref(),
            Some("https://image.tmdb.org/t/p/original/c.jpg")
        );
        assert_eq!(image_url(None, ImageSize::Small, ImageKind::Poster), None);
        assert_eq!(image_url(Some(""), ImageSize::Small, ImageKind::Poster), None);
    }

    #[test]
    fn test_genre_name_fallback() {
        assert_eq!(genre_name(878), "Science Fiction");
        assert_eq!(genre_name(1), "Genre 1");
    }

    #[test]
    fn test_resolve_genre() {
        let genres = vec![
            Genre { id: 28, name: "Action".into() },
            Genre { id: 878, name: "Science Fiction".into() },
        ];
        assert_eq!(resolve_genre(&genres, "action").map(|g| g.id), Some(28));
        assert_eq!(resolve_genre(&genres, "science-fiction").map(|g| g.id), Some(878));
        assert_eq!(resolve_genre(&genres, "878").map(|g| g.id), Some(878));
        assert!(resolve_genre(&genres, "western").is_none());
        assert_eq!(genre_slug("Science Fiction"), "science-fiction");
    }

    #[test]
    fn test_rating_rounding() {
        assert_eq!(rounded_rating(7.849), 7.8);
        assert_eq!(rounded_rating(8.25), 8.3);
    }
}
