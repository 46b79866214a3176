//! Command-line interface for the game service client
//!
//! Parses arguments with clap, merges them over the config file, and runs
//! commands against a [`GameApi`]. The `shell` command reads one command per
//! line from stdin and runs them all against the same API instance, so cache
//! hits, stale fallback, and invalidation can be observed within one process.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::api::{ApiError, GameApi};
use crate::config::{ConfigError, ServiceConfig};
use crate::data::{GameBackend, LeaderboardPeriod, ProgressUpdate};

/// Error types for running CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `shell` was entered from inside a shell
    #[error("Cannot start a shell from inside the shell")]
    NestedShell,
}

/// Game service client with a stale-tolerant response cache
#[derive(Parser, Debug)]
#[command(name = "gamesvc")]
#[command(about = "Query the game service through a TTL response cache")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a JSON config file (defaults to the XDG config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the game service; the built-in mock is used when unset
    #[arg(long, value_name = "URL", env = "GAMESVC_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Seconds a cached response stays fresh
    #[arg(long, value_name = "SECONDS", global = true)]
    pub ttl: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show details for a game
    Details { game_id: String },

    /// Show a game's leaderboard
    Leaderboard {
        game_id: String,
        /// Ranking window: daily, weekly, monthly, allTime
        #[arg(short, long, default_value_t = LeaderboardPeriod::Weekly)]
        period: LeaderboardPeriod,
    },

    /// List a game's achievements
    Achievements { game_id: String },

    /// Show a user's progress in a game
    Progress { game_id: String, user_id: String },

    /// Update a user's progress in a game
    UpdateProgress {
        game_id: String,
        user_id: String,
        /// Completion percentage (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        progress: Option<u8>,
        #[arg(long)]
        level: Option<u32>,
        #[arg(long)]
        score: Option<u64>,
    },

    /// Start a game session
    Session { game_id: String, user_id: String },

    /// Show details for several games at once
    Batch {
        #[arg(required = true, num_args = 1..)]
        game_ids: Vec<String>,
    },

    /// Drop cached entries whose key contains PATTERN, or all entries
    Clear { pattern: Option<String> },

    /// Show cache size, keys, and approximate memory use
    Stats,

    /// Show service information
    Info,

    /// Check backend health
    Health,

    /// Read commands from stdin, one per line, sharing one cache
    Shell,
}

/// A single line typed into the shell
#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "gamesvc>")]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Builds the effective configuration: config file first, then flags
pub fn resolve_config(cli: &Cli) -> Result<ServiceConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::load_default()?,
    };

    if let Some(ref base_url) = cli.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(ttl) = cli.ttl {
        config.cache_ttl_secs = ttl;
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }

    Ok(config)
}

/// Runs one non-shell command and returns its JSON result
pub async fn execute<B: GameBackend>(api: &GameApi<B>, command: &Command) -> Result<Value, CliError> {
    let output = match command {
        Command::Details { game_id } => serde_json::to_value(api.get_game_details(game_id).await?)?,
        Command::Leaderboard { game_id, period } => {
            serde_json::to_value(api.get_leaderboard(game_id, *period).await?)?
        }
        Command::Achievements { game_id } => {
            serde_json::to_value(api.get_game_achievements(game_id).await?)?
        }
        Command::Progress { game_id, user_id } => {
            serde_json::to_value(api.get_user_progress(game_id, user_id).await?)?
        }
        Command::UpdateProgress {
            game_id,
            user_id,
            progress,
            level,
            score,
        } => {
            let update = ProgressUpdate {
                progress: *progress,
                level: *level,
                score: *score,
                ..Default::default()
            };
            serde_json::to_value(api.update_user_progress(game_id, user_id, &update).await?)?
        }
        Command::Session { game_id, user_id } => {
            serde_json::to_value(api.start_game_session(game_id, user_id).await?)?
        }
        Command::Batch { game_ids } => serde_json::to_value(api.get_multiple_games_info(game_ids).await)?,
        Command::Clear { pattern } => json!({ "removed": api.clear_cache(pattern.as_deref()) }),
        Command::Stats => serde_json::to_value(api.cache_stats())?,
        Command::Info => serde_json::to_value(api.service_info())?,
        Command::Health => json!({ "healthy": api.check_health().await }),
        Command::Shell => return Err(CliError::NestedShell),
    };
    Ok(output)
}

/// Runs shell commands read from `input`, writing results to `out` and
/// per-line errors to `err`
///
/// Blank lines are skipped; `exit` or `quit` stop early. A failing line does
/// not end the session.
pub async fn run_shell<B, R, O, E>(
    api: &GameApi<B>,
    input: R,
    out: &mut O,
    err: &mut E,
) -> Result<(), CliError>
where
    B: GameBackend,
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let command = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                write!(err, "{e}")?;
                continue;
            }
        };

        match execute(api, &command).await {
            Ok(value) => writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?,
            Err(e) => writeln!(err, "error: {e}")?,
        }
    }
    Ok(())
}
