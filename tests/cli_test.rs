//! CLI Command Tests
//!
//! Runs command handlers against mocked backends and checks exit codes.
//! Argument parsing itself is covered by the unit tests in `cli.rs`.

use cinedeck::cli::{
    Cli, Command, ExitCode, GenreCmd, InfoCmd, MediaTypeArg, Output, PlayCmd, SearchCmd,
    SourcesCmd, TitleArgs, WatchlistAction, WatchlistCmd, WatchlistTarget,
};
use cinedeck::commands;
use cinedeck::config::Config;
use cinedeck::models::MediaType;
use cinedeck::watchlist::Watchlist;
use clap::Parser;
use mockito::{Matcher, Server};
use tempfile::TempDir;

/// Quiet JSON output so test logs stay readable
fn output() -> Output {
    Output {
        json: true,
        quiet: true,
    }
}

fn config(tmdb_url: Option<String>, sources_url: Option<String>, dir: &TempDir) -> Config {
    Config {
        tmdb_api_key: Some("test_key".to_string()),
        tmdb_base_url: tmdb_url,
        sources_api_url: sources_url,
        watchlist_path: Some(dir.path().join("watchlist.json")),
        ..Config::default()
    }
}

fn title(id: &str, season: Option<u16>, episode: Option<u16>) -> TitleArgs {
    TitleArgs {
        id: id.to_string(),
        media_type: None,
        season,
        episode,
    }
}

const ONE_PROVIDER: &str = r#"[{
    "source": {
        "provider": "vidsrc",
        "files": [
            {"file": "https://cdn.example/auto.m3u8", "type": "hls", "quality": "auto"},
            {"file": "https://cdn.example/720.m3u8", "type": "hls", "quality": "720p"}
        ]
    }
}]"#;

// =============================================================================
// Output helpers
// =============================================================================

mod output_helpers {
    use super::*;

    #[test]
    fn test_output_from_flags() {
        let cli = Cli::parse_from(["cinedeck", "--json", "--quiet", "genres"]);
        let output = Output::new(&cli);
        assert!(output.json);
        assert!(output.quiet);

        // Without a terminal on stdout JSON is used regardless of --json
        let cli = Cli::parse_from(["cinedeck", "genres"]);
        let output = Output::new(&cli);
        assert!(!output.quiet);
    }

    #[test]
    fn test_error_returns_code() {
        let code = output().error("boom", ExitCode::NetworkError);
        assert_eq!(code, ExitCode::NetworkError);
        assert_eq!(i32::from(code), 3);
    }

    #[test]
    fn test_command_aliases() {
        let cli = Cli::parse_from(["cinedeck", "wl", "ls", "-t", "tv"]);
        match cli.command {
            Command::Watchlist(WatchlistCmd {
                action: WatchlistAction::List { media_type },
            }) => assert_eq!(media_type, Some(MediaTypeArg::Tv)),
            other => panic!("Expected watchlist list, got {:?}", other),
        }
    }
}

// =============================================================================
// Catalog commands
// =============================================================================

mod catalog_commands {
    use super::*;

    #[tokio::test]
    async fn test_search_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search/multi")
            .match_query(Matcher::UrlEncoded("query".into(), "matrix".into()))
            .with_status(200)
            .with_body(
                r#"{"results": [{"id": 603, "media_type": "movie", "title": "The Matrix"}]}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(Some(server.url()), None, &dir);
        let cmd = SearchCmd {
            query: "matrix".to_string(),
            page: 1,
            media_type: None,
            limit: 20,
        };

        let code = commands::search_cmd(cmd, &config, &output()).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            tmdb_api_key: None,
            ..config(None, None, &dir)
        };
        let cmd = SearchCmd {
            query: "matrix".to_string(),
            page: 1,
            media_type: None,
            limit: 20,
        };

        let code = commands::search_cmd(cmd, &config, &output()).await;
        assert_eq!(code, ExitCode::InvalidArgs);
    }

    #[tokio::test]
    async fn test_info_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/movie/999999")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(Some(server.url()), None, &dir);
        let cmd = InfoCmd {
            id: 999999,
            media_type: MediaTypeArg::Movie,
        };

        let code = commands::info_cmd(cmd, &config, &output()).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::NotFound);
    }

    #[tokio::test]
    async fn test_info_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(Some("http://127.0.0.1:9".to_string()), None, &dir);
        let cmd = InfoCmd {
            id: 550,
            media_type: MediaTypeArg::Movie,
        };

        let code = commands::info_cmd(cmd, &config, &output()).await;
        assert_eq!(code, ExitCode::NetworkError);
    }

    #[tokio::test]
    async fn test_unknown_genre_slug() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/genre/movie/list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"genres": [{"id": 35, "name": "Comedy"}]}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(Some(server.url()), None, &dir);
        let cmd = GenreCmd {
            slug: "opera".to_string(),
            page: 1,
        };

        let code = commands::genre_cmd(cmd, &config, &output()).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::NotFound);
    }
}

// =============================================================================
// Playback commands
// =============================================================================

mod playback_commands {
    use super::*;

    #[tokio::test]
    async fn test_sources_for_episode() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/tv/1399")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("s".into(), "1".into()),
                Matcher::UrlEncoded("e".into(), "4".into()),
            ]))
            .with_status(200)
            .with_body(ONE_PROVIDER)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(None, Some(server.url()), &dir);
        let cmd = SourcesCmd {
            title: title("1399", None, Some(4)),
            provider: None,
        };

        let code = commands::sources_cmd(cmd, &config, &output()).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_sources_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(None, None, &dir);
        let cmd = SourcesCmd {
            title: title("550", None, None),
            provider: None,
        };

        let code = commands::sources_cmd(cmd, &config, &output()).await;
        assert_eq!(code, ExitCode::InvalidArgs);
    }

    #[tokio::test]
    async fn test_play_no_sources() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/movie/550")
            .with_status(200)
            .with_body(r#"[{"ERROR": "down"}]"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(None, Some(server.url()), &dir);
        let cmd = PlayCmd {
            title: title("550", None, None),
            provider: None,
            quality: None,
            subtitle: None,
        };

        let code = commands::play_cmd(cmd, &config, &output()).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::NoSources);
    }

    #[tokio::test]
    async fn test_play_unknown_provider() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/movie/550")
            .with_status(200)
            .with_body(ONE_PROVIDER)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(None, Some(server.url()), &dir);
        let cmd = PlayCmd {
            title: title("550", None, None),
            provider: Some("missing".to_string()),
            quality: Some("720p".to_string()),
            subtitle: None,
        };

        let code = commands::play_cmd(cmd, &config, &output()).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::InvalidArgs);
    }

    #[tokio::test]
    async fn test_play_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/movie/550")
            .with_status(200)
            .with_body(ONE_PROVIDER)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            preferred_quality: Some("720p".to_string()),
            ..config(None, Some(server.url()), &dir)
        };
        let cmd = PlayCmd {
            title: title("550", None, None),
            provider: Some("vidsrc".to_string()),
            quality: None,
            subtitle: Some("off".to_string()),
        };

        let code = commands::play_cmd(cmd, &config, &output()).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::Success);
    }
}

// =============================================================================
// Watchlist commands
// =============================================================================

mod watchlist_commands {
    use super::*;

    #[tokio::test]
    async fn test_add_check_remove() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/tv/1399")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "id": 1399, "name": "Game of Thrones",
                    "first_air_date": "2011-04-17", "poster_path": "/got.jpg",
                    "vote_average": 8.4
                }"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(Some(server.url()), None, &dir);
        let target = || WatchlistTarget {
            id: 1399,
            media_type: MediaTypeArg::Tv,
        };

        let code = commands::watchlist_cmd(
            WatchlistCmd {
                action: WatchlistAction::Add(target()),
            },
            &config,
            &output(),
        )
        .await;
        mock.assert_async().await;
        assert_eq!(code, ExitCode::Success);

        let saved = Watchlist::open(dir.path().join("watchlist.json"));
        assert!(saved.contains("1399", MediaType::Tv));
        let item = &saved.list_by(MediaType::Tv)[0];
        assert_eq!(item.title, "Game of Thrones");
        assert_eq!(item.first_air_date.as_deref(), Some("2011-04-17"));

        let code = commands::watchlist_cmd(
            WatchlistCmd {
                action: WatchlistAction::Remove(target()),
            },
            &config,
            &output(),
        )
        .await;
        assert_eq!(code, ExitCode::Success);

        let saved = Watchlist::open(dir.path().join("watchlist.json"));
        assert!(!saved.contains("1399", MediaType::Tv));
    }

    #[tokio::test]
    async fn test_list_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            tmdb_api_key: None,
            ..config(None, None, &dir)
        };

        let code = commands::watchlist_cmd(
            WatchlistCmd {
                action: WatchlistAction::List { media_type: None },
            },
            &config,
            &output(),
        )
        .await;
        assert_eq!(code, ExitCode::Success);
    }
}
