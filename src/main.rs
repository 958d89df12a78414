//! cinedeck - movie and TV discovery backend with a same-origin streaming relay
//!
//! # Usage
//!
//! ```bash
//! # HTTP service
//! cinedeck serve
//!
//! # CLI mode (for automation)
//! cinedeck search "blade runner"
//! cinedeck play 1399 -s 1 -e 1 --json
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cinedeck::cli::{Cli, Command, ExitCode, Output};
use cinedeck::commands;
use cinedeck::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

/// Logs go to stderr so JSON on stdout stays parseable
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };

    match cli.command {
        Command::Serve(cmd) => commands::serve_cmd(cmd, &config, &output).await,
        Command::Search(cmd) => commands::search_cmd(cmd, &config, &output).await,
        Command::Popular(cmd) => commands::popular_cmd(cmd, &config, &output).await,
        Command::TopRated(cmd) => commands::top_rated_cmd(cmd, &config, &output).await,
        Command::Trending(cmd) => commands::trending_cmd(cmd, &config, &output).await,
        Command::Genres(cmd) => commands::genres_cmd(cmd, &config, &output).await,
        Command::Genre(cmd) => commands::genre_cmd(cmd, &config, &output).await,
        Command::Info(cmd) => commands::info_cmd(cmd, &config, &output).await,
        Command::Season(cmd) => commands::season_cmd(cmd, &config, &output).await,
        Command::Sources(cmd) => commands::sources_cmd(cmd, &config, &output).await,
        Command::Play(cmd) => commands::play_cmd(cmd, &config, &output).await,
        Command::Watchlist(cmd) => commands::watchlist_cmd(cmd, &config, &output).await,
    }
}
