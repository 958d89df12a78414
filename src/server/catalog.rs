//! Catalog and detail handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, AppState};
use crate::catalog::{resolve_genre, MediaCard};
use crate::models::{
    Episode, Genre, MediaSummary, MediaType, MovieDetail, Page, TimeWindow, TrendingScope,
    TvDetail,
};

/// `?type=movie|tv&page=N`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub page: Option<u32>,
}

/// `?type=all|movie|tv&window=day|week`
#[derive(Debug, Default, Deserialize)]
pub struct TrendingQuery {
    #[serde(rename = "type")]
    pub scope: Option<String>,
    pub window: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Detail payload: the raw detail plus the normalized card
#[derive(Debug, Serialize)]
pub struct DetailResponse<T> {
    pub detail: T,
    pub card: MediaCard,
}

/// Parse an optional `type` parameter, defaulting to movies
pub(crate) fn media_param(value: Option<&str>) -> ApiResult<MediaType> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse().map_err(ApiError::bad_request),
        None => Ok(MediaType::Movie),
    }
}

fn page_param(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

fn card_page(page: Page<MediaSummary>) -> Page<MediaCard> {
    page.map(|item| MediaCard::from_summary(&item))
}

/// GET /api/catalog/popular
pub async fn popular(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<MediaCard>>> {
    let media = media_param(query.media_type.as_deref())?;
    let page = state.tmdb.popular(media, page_param(query.page)).await?;
    Ok(Json(card_page(page)))
}

/// GET /api/catalog/top-rated
pub async fn top_rated(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<MediaCard>>> {
    let media = media_param(query.media_type.as_deref())?;
    let page = state.tmdb.top_rated(media, page_param(query.page)).await?;
    Ok(Json(card_page(page)))
}

/// GET /api/catalog/trending
pub async fn trending(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> ApiResult<Json<Page<MediaCard>>> {
    let scope: TrendingScope = match query.scope.as_deref() {
        Some(s) if !s.is_empty() => s.parse().map_err(ApiError::bad_request)?,
        _ => TrendingScope::default(),
    };
    let window: TimeWindow = match query.window.as_deref() {
        Some(w) if !w.is_empty() => w.parse().map_err(ApiError::bad_request)?,
        _ => TimeWindow::default(),
    };

    let page = state.tmdb.trending(scope, window).await?;
    Ok(Json(card_page(page)))
}

/// GET /api/catalog/genres
pub async fn genres(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Genre>>> {
    let media = media_param(query.media_type.as_deref())?;
    Ok(Json(state.tmdb.genres(media).await?))
}

/// GET /api/catalog/genre/:slug
pub async fn genre(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<MediaCard>>> {
    let genres = state.tmdb.genres(MediaType::Movie).await?;
    let genre = resolve_genre(&genres, &slug)
        .ok_or_else(|| ApiError::not_found(format!("Unknown genre: {}", slug)))?;

    let page = state
        .tmdb
        .discover_by_genre(genre.id, page_param(query.page))
        .await?;
    Ok(Json(card_page(page)))
}

/// GET /api/catalog/search
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Page<MediaCard>>> {
    let q = query.q.unwrap_or_default();
    let page = state.tmdb.search(&q, page_param(query.page)).await?;
    Ok(Json(card_page(page)))
}

/// GET /api/movie/:id
pub async fn movie(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<DetailResponse<MovieDetail>>> {
    let detail = state.tmdb.movie_detail(id).await?;
    let card = MediaCard::from_movie(&detail);
    Ok(Json(DetailResponse { detail, card }))
}

/// GET /api/tv/:id
pub async fn tv(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<DetailResponse<TvDetail>>> {
    let detail = state.tmdb.tv_detail(id).await?;
    let card = MediaCard::from_tv(&detail);
    Ok(Json(DetailResponse { detail, card }))
}

/// GET /api/tv/:id/season/:season
pub async fn season(
    State(state): State<AppState>,
    Path((id, season)): Path<(u64, u16)>,
) -> ApiResult<Json<Vec<Episode>>> {
    Ok(Json(state.tmdb.tv_season(id, season).await?))
}
