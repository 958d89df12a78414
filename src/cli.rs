//! CLI - Command Line Interface for cinedeck
//!
//! Every catalog, playback and watchlist action of the HTTP service is also
//! scriptable from the shell. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Run the HTTP service
//! cinedeck serve --bind 0.0.0.0:3000
//!
//! # Browse the catalog
//! cinedeck search "the batman" --json
//! cinedeck trending -t movie -w week
//!
//! # Resolve a playable stream
//! cinedeck play 1399 -s 1 -e 2 --quality 1080p --subtitle English
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{MediaType, TimeWindow, TrendingScope};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments or configuration
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Title not found
    NotFound = 4,
    /// No video sources available
    NoSources = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// cinedeck - movie and TV discovery with a same-origin streaming relay
#[derive(Parser, Debug)]
#[command(
    name = "cinedeck",
    version,
    about = "Movie and TV discovery backend with a same-origin streaming relay",
    long_about = "Browse TMDB catalog data, negotiate provider streams and relay \
                  them through a same-origin proxy.\n\n\
                  Run `cinedeck serve` for the HTTP service.\n\
                  Use the other subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  cinedeck serve                       Start the HTTP service\n\
                  cinedeck search \"blade runner\"       Search for content\n\
                  cinedeck info 550 -t movie           Movie details\n\
                  cinedeck play 1399 -s 1 -e 1 --json  Resolve a stream"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeCmd),

    /// Search for movies and TV shows
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Popular movies or TV shows
    Popular(ListCmd),

    /// Top rated movies or TV shows
    TopRated(ListCmd),

    /// Trending content
    #[command(visible_alias = "tr")]
    Trending(TrendingCmd),

    /// List genres
    Genres(GenresCmd),

    /// Movies in a genre
    Genre(GenreCmd),

    /// Get details for a movie or show
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// List the episodes of a season
    Season(SeasonCmd),

    /// List streaming providers for a movie or episode
    #[command(visible_alias = "src")]
    Sources(SourcesCmd),

    /// Resolve a playable stream for a movie or episode
    Play(PlayCmd),

    /// Manage the local watchlist
    #[command(visible_alias = "wl")]
    Watchlist(WatchlistCmd),
}

/// Media type argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaTypeArg {
    /// Movies
    #[default]
    Movie,
    /// TV shows
    Tv,
}

impl From<MediaTypeArg> for MediaType {
    fn from(arg: MediaTypeArg) -> Self {
        match arg {
            MediaTypeArg::Movie => MediaType::Movie,
            MediaTypeArg::Tv => MediaType::Tv,
        }
    }
}

// =============================================================================
// Serve Command
// =============================================================================

/// Start the HTTP service
#[derive(Args, Debug)]
pub struct ServeCmd {
    /// Listen address (overrides config and CINEDECK_BIND)
    #[arg(long, short = 'b')]
    pub bind: Option<String>,
}

// =============================================================================
// Catalog Commands
// =============================================================================

/// Search for movies and TV shows by query
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search query (title, keywords)
    #[arg(required = true)]
    pub query: String,

    /// Result page
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,

    /// Filter by media type
    #[arg(long, short = 't', value_enum)]
    pub media_type: Option<MediaTypeArg>,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

/// Paginated listing (popular, top-rated)
#[derive(Args, Debug)]
pub struct ListCmd {
    /// Media type
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeArg,

    /// Result page
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,
}

/// Get trending movies and TV shows
#[derive(Args, Debug)]
pub struct TrendingCmd {
    /// What to include
    #[arg(long, short = 't', value_enum, default_value = "all")]
    pub scope: TrendingScopeArg,

    /// Time window for trending
    #[arg(long, short = 'w', value_enum, default_value = "day")]
    pub window: TrendingWindow,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

/// Scope for trending content
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendingScopeArg {
    /// Movies and TV shows
    #[default]
    All,
    /// Movies only
    Movie,
    /// TV shows only
    Tv,
}

impl From<TrendingScopeArg> for TrendingScope {
    fn from(arg: TrendingScopeArg) -> Self {
        match arg {
            TrendingScopeArg::All => TrendingScope::All,
            TrendingScopeArg::Movie => TrendingScope::Movie,
            TrendingScopeArg::Tv => TrendingScope::Tv,
        }
    }
}

/// Time window for trending content
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendingWindow {
    /// Today's trending
    #[default]
    Day,
    /// This week's trending
    Week,
}

impl From<TrendingWindow> for TimeWindow {
    fn from(arg: TrendingWindow) -> Self {
        match arg {
            TrendingWindow::Day => TimeWindow::Day,
            TrendingWindow::Week => TimeWindow::Week,
        }
    }
}

/// List the official genres
#[derive(Args, Debug)]
pub struct GenresCmd {
    /// Media type
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeArg,
}

/// Browse movies in a genre
#[derive(Args, Debug)]
pub struct GenreCmd {
    /// Genre name, slug (science-fiction) or id
    #[arg(required = true)]
    pub slug: String,

    /// Result page
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,
}

/// Get detailed information about a movie or TV show
#[derive(Args, Debug)]
pub struct InfoCmd {
    /// TMDB ID
    #[arg(required = true)]
    pub id: u64,

    /// Media type
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeArg,
}

/// List the episodes of a TV season
#[derive(Args, Debug)]
pub struct SeasonCmd {
    /// TMDB ID of the show
    #[arg(required = true)]
    pub id: u64,

    /// Season number
    #[arg(required = true)]
    pub season: u16,
}

// =============================================================================
// Playback Commands
// =============================================================================

/// Title selector shared by `sources` and `play`
#[derive(Args, Debug, Clone)]
pub struct TitleArgs {
    /// TMDB ID
    #[arg(required = true)]
    pub id: String,

    /// Media type (TV is implied by --season or --episode)
    #[arg(long, short = 't', value_enum)]
    pub media_type: Option<MediaTypeArg>,

    /// Season number (TV, default 1)
    #[arg(long, short = 's')]
    pub season: Option<u16>,

    /// Episode number (TV, default 1)
    #[arg(long, short = 'e')]
    pub episode: Option<u16>,
}

impl TitleArgs {
    /// Effective media type
    pub fn media_type(&self) -> MediaType {
        match self.media_type {
            Some(arg) => arg.into(),
            None if self.season.is_some() || self.episode.is_some() => MediaType::Tv,
            None => MediaType::Movie,
        }
    }
}

/// List streaming providers for a movie or TV episode
#[derive(Args, Debug)]
pub struct SourcesCmd {
    #[command(flatten)]
    pub title: TitleArgs,

    /// Only ask this provider
    #[arg(long)]
    pub provider: Option<String>,
}

/// Resolve a playable, proxied stream
#[derive(Args, Debug)]
pub struct PlayCmd {
    #[command(flatten)]
    pub title: TitleArgs,

    /// Provider name (default: first available)
    #[arg(long)]
    pub provider: Option<String>,

    /// Quality label as offered by the provider (e.g. 1080p)
    #[arg(long, short = 'Q')]
    pub quality: Option<String>,

    /// Subtitle language, or "off"
    #[arg(long)]
    pub subtitle: Option<String>,
}

// =============================================================================
// Watchlist Commands
// =============================================================================

/// Manage the local watchlist
#[derive(Args, Debug)]
pub struct WatchlistCmd {
    #[command(subcommand)]
    pub action: WatchlistAction,
}

#[derive(Subcommand, Debug)]
pub enum WatchlistAction {
    /// List saved titles
    #[command(visible_alias = "ls")]
    List {
        /// Only this media type
        #[arg(long, short = 't', value_enum)]
        media_type: Option<MediaTypeArg>,
    },

    /// Save a title (details are fetched from TMDB)
    Add(WatchlistTarget),

    /// Remove a title
    #[command(visible_alias = "rm")]
    Remove(WatchlistTarget),

    /// Check whether a title is saved
    Check(WatchlistTarget),
}

#[derive(Args, Debug)]
pub struct WatchlistTarget {
    /// TMDB ID
    #[arg(required = true)]
    pub id: u64,

    /// Media type
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeArg,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Watchlist membership response
#[derive(Debug, Serialize, Deserialize)]
pub struct WatchlistStatus {
    pub id: String,
    pub media_type: MediaType,
    pub in_watchlist: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print success data, using `human` for terminal output
    pub fn print_with<T: Serialize>(
        &self,
        data: T,
        human: impl FnOnce(&T) -> Vec<String>,
    ) -> anyhow::Result<()> {
        if self.json {
            return self.print(data);
        }
        for line in human(&data) {
            println!("{}", line);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_command() {
        let cli = Cli::parse_from(["cinedeck", "search", "batman"]);
        if let Command::Search(cmd) = cli.command {
            assert_eq!(cmd.query, "batman");
            assert_eq!(cmd.page, 1);
            assert_eq!(cmd.limit, 20);
        } else {
            panic!("Expected Search command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "cinedeck",
            "--json",
            "--quiet",
            "--config",
            "/tmp/cinedeck.toml",
            "popular",
            "-t",
            "tv",
        ]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/cinedeck.toml")));
        if let Command::Popular(cmd) = cli.command {
            assert_eq!(cmd.media_type, MediaTypeArg::Tv);
        } else {
            panic!("Expected Popular command");
        }
    }

    #[test]
    fn test_play_with_options() {
        let cli = Cli::parse_from([
            "cinedeck",
            "play",
            "1399",
            "-s",
            "2",
            "-e",
            "3",
            "--provider",
            "vidsrc",
            "-Q",
            "1080p",
            "--subtitle",
            "English",
        ]);
        if let Command::Play(cmd) = cli.command {
            assert_eq!(cmd.title.id, "1399");
            assert_eq!(cmd.title.media_type(), MediaType::Tv);
            assert_eq!(cmd.title.season, Some(2));
            assert_eq!(cmd.title.episode, Some(3));
            assert_eq!(cmd.provider.as_deref(), Some("vidsrc"));
            assert_eq!(cmd.quality.as_deref(), Some("1080p"));
            assert_eq!(cmd.subtitle.as_deref(), Some("English"));
        } else {
            panic!("Expected Play command");
        }
    }

    #[test]
    fn test_title_media_type_inference() {
        let title = TitleArgs {
            id: "550".into(),
            media_type: None,
            season: None,
            episode: None,
        };
        assert_eq!(title.media_type(), MediaType::Movie);

        let title = TitleArgs {
            media_type: Some(MediaTypeArg::Tv),
            ..title
        };
        assert_eq!(title.media_type(), MediaType::Tv);
    }

    #[test]
    fn test_watchlist_subcommands() {
        let cli = Cli::parse_from(["cinedeck", "watchlist", "add", "550"]);
        match cli.command {
            Command::Watchlist(WatchlistCmd {
                action: WatchlistAction::Add(target),
            }) => {
                assert_eq!(target.id, 550);
                assert_eq!(target.media_type, MediaTypeArg::Movie);
            }
            other => panic!("Expected watchlist add, got {:?}", other),
        }

        let cli = Cli::parse_from(["cinedeck", "wl", "ls", "-t", "tv"]);
        assert!(matches!(
            cli.command,
            Command::Watchlist(WatchlistCmd {
                action: WatchlistAction::List {
                    media_type: Some(MediaTypeArg::Tv)
                }
            })
        ));
    }

    #[test]
    fn test_trending_defaults() {
        let cli = Cli::parse_from(["cinedeck", "trending"]);
        if let Command::Trending(cmd) = cli.command {
            assert_eq!(TrendingScope::from(cmd.scope), TrendingScope::All);
            assert_eq!(TimeWindow::from(cmd.window), TimeWindow::Day);
        } else {
            panic!("Expected Trending command");
        }
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["cinedeck"]).is_err());
    }

    #[test]
    fn test_json_output_skips_zero_exit_code() {
        let out = JsonOutput::success(vec![1, 2]);
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"data":[1,2]}"#);

        let err = JsonOutput::<()>::error_msg("No valid video sources available", ExitCode::NoSources);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["exit_code"], 5);
        assert_eq!(json["error"], "No valid video sources available");
    }
}
