//! Watchlist handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::catalog::media_param;
use super::{ApiResult, AppState};
use crate::models::WatchlistItem;

#[derive(Debug, Default, Deserialize)]
pub struct WatchlistQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WatchlistStatus {
    pub in_watchlist: bool,
}

/// GET /api/watchlist; every item unless `type` is given
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<WatchlistQuery>,
) -> ApiResult<Json<Vec<WatchlistItem>>> {
    let watchlist = state.watchlist.lock().await;
    let items = match query.media_type.as_deref() {
        Some(t) if !t.is_empty() => watchlist.list_by(media_param(Some(t))?).to_vec(),
        _ => watchlist.list(),
    };
    Ok(Json(items))
}

/// POST /api/watchlist
pub async fn add(
    State(state): State<AppState>,
    Json(item): Json<WatchlistItem>,
) -> ApiResult<(StatusCode, Json<WatchlistItem>)> {
    let added = state.watchlist.lock().await.add(item.clone())?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(item)))
}

/// GET /api/watchlist/:media_type/:id
pub async fn check(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
) -> ApiResult<Json<WatchlistStatus>> {
    let media = media_param(Some(&media_type))?;
    let in_watchlist = state.watchlist.lock().await.contains(&id, media);
    Ok(Json(WatchlistStatus { in_watchlist }))
}

/// DELETE /api/watchlist/:media_type/:id
pub async fn remove(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let media = media_param(Some(&media_type))?;
    if !state.watchlist.lock().await.remove(&id, media)? {
        tracing::debug!(%id, "Nothing to remove from watchlist");
    }
    Ok(StatusCode::NO_CONTENT)
}
