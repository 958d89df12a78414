//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the library clients.
//! Each handler takes CLI args, the loaded config and Output, returns ExitCode.

use serde::Serialize;

use crate::api::{SourceRequest, SourcesClient, SourcesError, TmdbClient, TmdbError};
use crate::catalog::{genre_slug, resolve_genre, MediaCard};
use crate::cli::{
    ExitCode, GenreCmd, GenresCmd, InfoCmd, ListCmd, MediaTypeArg, Output, PlayCmd, SearchCmd,
    SeasonCmd, ServeCmd, SourcesCmd, TitleArgs, TrendingCmd, WatchlistAction, WatchlistCmd,
    WatchlistStatus, WatchlistTarget,
};
use crate::config::Config;
use crate::models::{MediaSummary, MediaType, Page, WatchlistItem};
use crate::server::{self, AppState};
use crate::stream::negotiator::{NegotiationError, PlayChoices};
use crate::stream::{ProxyRoutes, SourceNegotiator};
use crate::watchlist::Watchlist;

// =============================================================================
// Shared helpers
// =============================================================================

fn tmdb_client(config: &Config, output: &Output) -> Result<TmdbClient, ExitCode> {
    let key = config
        .tmdb_api_key()
        .map_err(|e| output.error(e.to_string(), ExitCode::InvalidArgs))?;
    Ok(TmdbClient::with_base_url(key, config.tmdb_base_url()).with_language(config.language()))
}

fn tmdb_failure(output: &Output, context: &str, err: TmdbError) -> ExitCode {
    let code = match err {
        TmdbError::NotFound => ExitCode::NotFound,
        _ => ExitCode::NetworkError,
    };
    output.error(format!("{}: {}", context, err), code)
}

fn sources_failure(output: &Output, err: SourcesError) -> ExitCode {
    let code = match err {
        SourcesError::NoValidSources => ExitCode::NoSources,
        SourcesError::NotConfigured | SourcesError::MissingEpisode => ExitCode::InvalidArgs,
        SourcesError::Upstream(_) | SourcesError::InvalidResponse(_) => ExitCode::NetworkError,
    };
    output.error(err.to_string(), code)
}

fn negotiation_failure(output: &Output, err: NegotiationError) -> ExitCode {
    let code = match err {
        NegotiationError::UnknownProvider(_) => ExitCode::InvalidArgs,
        NegotiationError::NoProviders | NegotiationError::NoFiles(_) => ExitCode::NoSources,
    };
    output.error(err.to_string(), code)
}

fn finish<T: Serialize>(output: &Output, data: T) -> ExitCode {
    match output.print(data) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

fn card_line(card: &MediaCard) -> String {
    let year = if card.year > 0 {
        card.year.to_string()
    } else {
        "----".to_string()
    };
    format!(
        "{:>8}  {:<5} {}  {:.1}  {}",
        card.id,
        card.media_type.as_path(),
        year,
        card.rating,
        card.title
    )
}

fn finish_cards(output: &Output, page: Page<MediaCard>) -> ExitCode {
    let printed = output.print_with(page, |page| {
        let mut lines: Vec<String> = page.results.iter().map(card_line).collect();
        lines.push(format!("page {}/{}", page.page, page.total_pages));
        lines
    });
    match printed {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

fn to_cards(page: Page<MediaSummary>) -> Page<MediaCard> {
    page.map(|item| MediaCard::from_summary(&item))
}

fn source_request(title: &TitleArgs) -> SourceRequest {
    match title.media_type() {
        MediaType::Movie => SourceRequest::movie(title.id.clone()),
        MediaType::Tv => SourceRequest::episode(
            title.id.clone(),
            title.season.unwrap_or(1),
            title.episode.unwrap_or(1),
        ),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

pub async fn serve_cmd(cmd: ServeCmd, config: &Config, output: &Output) -> ExitCode {
    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };
    let bind = cmd.bind.as_deref().unwrap_or_else(|| config.bind());

    output.info(format!("Serving on http://{}", bind));

    match server::serve(bind, state).await {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("{:#}", e), ExitCode::Error),
    }
}

// =============================================================================
// Catalog Commands
// =============================================================================

pub async fn search_cmd(cmd: SearchCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    output.info(format!("Searching for: {}", cmd.query));

    match client.search(&cmd.query, cmd.page.max(1)).await {
        Ok(page) => {
            let mut page = to_cards(page);
            if let Some(filter) = cmd.media_type {
                let wanted = MediaType::from(filter);
                page.results.retain(|c| c.media_type == wanted);
            }
            page.results.truncate(cmd.limit);
            finish_cards(output, page)
        }
        Err(e) => tmdb_failure(output, "Search failed", e),
    }
}

pub async fn popular_cmd(cmd: ListCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.popular(cmd.media_type.into(), cmd.page.max(1)).await {
        Ok(page) => finish_cards(output, to_cards(page)),
        Err(e) => tmdb_failure(output, "Popular fetch failed", e),
    }
}

pub async fn top_rated_cmd(cmd: ListCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.top_rated(cmd.media_type.into(), cmd.page.max(1)).await {
        Ok(page) => finish_cards(output, to_cards(page)),
        Err(e) => tmdb_failure(output, "Top rated fetch failed", e),
    }
}

pub async fn trending_cmd(cmd: TrendingCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.trending(cmd.scope.into(), cmd.window.into()).await {
        Ok(page) => {
            let mut page = to_cards(page);
            page.results.truncate(cmd.limit);
            finish_cards(output, page)
        }
        Err(e) => tmdb_failure(output, "Trending fetch failed", e),
    }
}

pub async fn genres_cmd(cmd: GenresCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.genres(cmd.media_type.into()).await {
        Ok(genres) => {
            let printed = output.print_with(genres, |genres| {
                genres
                    .iter()
                    .map(|g| format!("{:>6}  {:<18} {}", g.id, g.name, genre_slug(&g.name)))
                    .collect()
            });
            match printed {
                Ok(()) => ExitCode::Success,
                Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
            }
        }
        Err(e) => tmdb_failure(output, "Genre list failed", e),
    }
}

pub async fn genre_cmd(cmd: GenreCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let genres = match client.genres(MediaType::Movie).await {
        Ok(g) => g,
        Err(e) => return tmdb_failure(output, "Genre list failed", e),
    };
    let genre = match resolve_genre(&genres, &cmd.slug) {
        Some(g) => g,
        None => return output.error(format!("Unknown genre: {}", cmd.slug), ExitCode::NotFound),
    };

    output.info(format!("Browsing {}", genre.name));

    match client.discover_by_genre(genre.id, cmd.page.max(1)).await {
        Ok(page) => finish_cards(output, to_cards(page)),
        Err(e) => tmdb_failure(output, "Genre fetch failed", e),
    }
}

#[derive(Serialize)]
struct InfoOutput<T: Serialize> {
    detail: T,
    card: MediaCard,
}

pub async fn info_cmd(cmd: InfoCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    output.info(format!("Getting info for: {}", cmd.id));

    match cmd.media_type {
        MediaTypeArg::Movie => match client.movie_detail(cmd.id).await {
            Ok(detail) => {
                let card = MediaCard::from_movie(&detail);
                finish(output, InfoOutput { detail, card })
            }
            Err(e) => tmdb_failure(output, "Movie info failed", e),
        },
        MediaTypeArg::Tv => match client.tv_detail(cmd.id).await {
            Ok(detail) => {
                let card = MediaCard::from_tv(&detail);
                finish(output, InfoOutput { detail, card })
            }
            Err(e) => tmdb_failure(output, "TV info failed", e),
        },
    }
}

pub async fn season_cmd(cmd: SeasonCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.tv_season(cmd.id, cmd.season).await {
        Ok(episodes) => {
            let printed = output.print_with(episodes, |episodes| {
                episodes.iter().map(|e| e.to_string()).collect()
            });
            match printed {
                Ok(()) => ExitCode::Success,
                Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
            }
        }
        Err(e) => tmdb_failure(output, "Season fetch failed", e),
    }
}

// =============================================================================
// Playback Commands
// =============================================================================

pub async fn sources_cmd(cmd: SourcesCmd, config: &Config, output: &Output) -> ExitCode {
    let client = SourcesClient::new(config.sources_api_url.clone());
    let request = source_request(&cmd.title).with_provider(cmd.provider);

    output.info(format!("Finding sources for: {}", cmd.title.id));

    match client.fetch(&request).await {
        Ok(providers) => {
            let printed = output.print_with(providers, |providers| {
                providers
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("[{}] {}", i, p))
                    .collect()
            });
            match printed {
                Ok(()) => ExitCode::Success,
                Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
            }
        }
        Err(e) => sources_failure(output, e),
    }
}

pub async fn play_cmd(cmd: PlayCmd, config: &Config, output: &Output) -> ExitCode {
    let client = SourcesClient::new(config.sources_api_url.clone());
    let request = source_request(&cmd.title);

    output.info(format!("Resolving stream for: {}", cmd.title.id));

    let providers = match client.fetch(&request).await {
        Ok(p) => p,
        Err(e) => return sources_failure(output, e),
    };

    let mut negotiator = match SourceNegotiator::new(providers) {
        Ok(n) => n,
        Err(e) => return negotiation_failure(output, e),
    };

    let choices = PlayChoices {
        provider: cmd.provider,
        quality: cmd.quality,
        subtitle: cmd.subtitle,
    };
    if let Err(e) = negotiator.apply(&choices, config.preferred_quality()) {
        return negotiation_failure(output, e);
    }

    match negotiator.plan(&ProxyRoutes::default()) {
        Ok(plan) => {
            output.info(format!(
                "{} / {} ({} subtitle track(s))",
                plan.provider,
                plan.quality,
                plan.subtitles.len()
            ));
            finish(output, plan)
        }
        Err(e) => negotiation_failure(output, e),
    }
}

// =============================================================================
// Watchlist Commands
// =============================================================================

fn open_watchlist(config: &Config, output: &Output) -> Result<Watchlist, ExitCode> {
    match config.watchlist_path() {
        Some(path) => Ok(Watchlist::open(path)),
        None => Err(output.error(
            "Could not determine watchlist location; set watchlist_path in config",
            ExitCode::Error,
        )),
    }
}

pub async fn watchlist_cmd(cmd: WatchlistCmd, config: &Config, output: &Output) -> ExitCode {
    let mut watchlist = match open_watchlist(config, output) {
        Ok(w) => w,
        Err(code) => return code,
    };

    match cmd.action {
        WatchlistAction::List { media_type } => {
            let items = match media_type {
                Some(t) => watchlist.list_by(t.into()).to_vec(),
                None => watchlist.list(),
            };
            let printed = output.print_with(items, |items| {
                items
                    .iter()
                    .map(|i| format!("{:>8}  {:<5} {}", i.id, i.media_type.as_path(), i.title))
                    .collect()
            });
            match printed {
                Ok(()) => ExitCode::Success,
                Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
            }
        }
        WatchlistAction::Add(target) => watchlist_add(target, &mut watchlist, config, output).await,
        WatchlistAction::Remove(target) => {
            let media: MediaType = target.media_type.into();
            let id = target.id.to_string();
            match watchlist.remove(&id, media) {
                Ok(changed) => finish(
                    output,
                    WatchlistStatus {
                        id,
                        media_type: media,
                        in_watchlist: false,
                        changed: Some(changed),
                    },
                ),
                Err(e) => output.error(e.to_string(), ExitCode::Error),
            }
        }
        WatchlistAction::Check(target) => {
            let media: MediaType = target.media_type.into();
            let id = target.id.to_string();
            let in_watchlist = watchlist.contains(&id, media);
            finish(
                output,
                WatchlistStatus {
                    id,
                    media_type: media,
                    in_watchlist,
                    changed: None,
                },
            )
        }
    }
}

async fn watchlist_add(
    target: WatchlistTarget,
    watchlist: &mut Watchlist,
    config: &Config,
    output: &Output,
) -> ExitCode {
    let client = match tmdb_client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let card = match target.media_type {
        MediaTypeArg::Movie => client.movie_detail(target.id).await.map(|d| MediaCard::from_movie(&d)),
        MediaTypeArg::Tv => client.tv_detail(target.id).await.map(|d| MediaCard::from_tv(&d)),
    };
    let card = match card {
        Ok(c) => c,
        Err(e) => return tmdb_failure(output, "Lookup failed", e),
    };

    let item = WatchlistItem::from(&card);
    output.info(format!("Saving {}", item.title));

    match watchlist.add(item.clone()) {
        Ok(changed) => finish(
            output,
            WatchlistStatus {
                id: item.id,
                media_type: item.media_type,
                in_watchlist: true,
                changed: Some(changed),
            },
        ),
        Err(e) => output.error(e.to_string(), ExitCode::Error),
    }
}
