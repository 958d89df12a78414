//! Source lookup, negotiation and relay handlers

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiResult, AppState};
use crate::api::SourceRequest;
use crate::models::{MediaType, ProviderSource};
use crate::stream::negotiator::{PlayChoices, PlaybackPlan, ProviderOption, SubtitleChoice};
use crate::stream::proxy::{self, ProxyError, UrlQuery};
use crate::stream::SourceNegotiator;

/// `?s=&e=&provider=`
#[derive(Debug, Default, Deserialize)]
pub struct SourcesQuery {
    pub s: Option<u16>,
    pub e: Option<u16>,
    pub provider: Option<String>,
}

/// `?s=&e=&provider=&quality=&subtitle=`
#[derive(Debug, Default, Deserialize)]
pub struct PlayQuery {
    pub s: Option<u16>,
    pub e: Option<u16>,
    pub provider: Option<String>,
    pub quality: Option<String>,
    pub subtitle: Option<String>,
}

impl PlayQuery {
    fn choices(&self) -> PlayChoices {
        PlayChoices {
            provider: self.provider.clone(),
            quality: self.quality.clone(),
            subtitle: self.subtitle.clone(),
        }
    }
}

/// Player payload: the resolved plan plus the menus to switch it
#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub media_type: MediaType,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u16>,
    pub plan: PlaybackPlan,
    pub providers: Vec<ProviderOption>,
    pub subtitle: SubtitleChoice,
}

/// Episode request with the watch page defaults (season 1, episode 1)
fn episode_request(id: String, season: Option<u16>, episode: Option<u16>) -> SourceRequest {
    SourceRequest::episode(id, season.unwrap_or(1), episode.unwrap_or(1))
}

/// GET /api/sources/movie/:id
pub async fn movie_sources(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SourcesQuery>,
) -> ApiResult<Json<Vec<ProviderSource>>> {
    let request = SourceRequest::movie(id).with_provider(query.provider);
    Ok(Json(state.sources.fetch(&request).await?))
}

/// GET /api/sources/tv/:id
pub async fn tv_sources(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SourcesQuery>,
) -> ApiResult<Json<Vec<ProviderSource>>> {
    let request = episode_request(id, query.s, query.e).with_provider(query.provider);
    Ok(Json(state.sources.fetch(&request).await?))
}

/// GET /api/play/movie/:id
pub async fn play_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PlayQuery>,
) -> ApiResult<Json<PlayResponse>> {
    let request = SourceRequest::movie(id);
    play(&state, request, &query.choices()).await.map(Json)
}

/// GET /api/play/tv/:id
pub async fn play_tv(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PlayQuery>,
) -> ApiResult<Json<PlayResponse>> {
    let request = episode_request(id, query.s, query.e);
    play(&state, request, &query.choices()).await.map(Json)
}

/// Fetch every provider, apply the viewer's choices and build the plan
async fn play(
    state: &AppState,
    request: SourceRequest,
    choices: &PlayChoices,
) -> ApiResult<PlayResponse> {
    let providers = state.sources.fetch(&request).await?;

    let mut negotiator = SourceNegotiator::new(providers)?;
    negotiator.apply(choices, state.preferred_quality)?;
    let plan = negotiator.plan(state.relay.routes())?;

    tracing::info!(
        id = %request.tmdb_id,
        provider = %plan.provider,
        quality = %plan.quality,
        "Resolved playback"
    );

    Ok(PlayResponse {
        media_type: request.media_type,
        id: request.tmdb_id,
        season: request.season,
        episode: request.episode,
        providers: negotiator.menu(),
        subtitle: negotiator.selected_subtitle().clone(),
        plan,
    })
}

/// GET /api/video?url=
pub async fn proxy_video(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
    headers: HeaderMap,
) -> Result<Response, ProxyError> {
    state.relay.relay(query.url.as_deref(), &headers).await
}

/// OPTIONS /api/video
pub async fn proxy_preflight() -> Response {
    proxy::preflight()
}

/// GET /api/subtitle?url=
pub async fn proxy_subtitle(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Response, ProxyError> {
    state.relay.relay_subtitle(query.url.as_deref()).await
}
