//! Game service CLI - query game data through a stale-tolerant cache
//!
//! Talks to the game service over HTTP when a base URL is configured and to
//! the built-in mock backend otherwise. Results are printed to stdout as JSON;
//! logs go to stderr.

use std::io::{self, Write};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gamesvc::api::GameApi;
use gamesvc::cli::{execute, resolve_config, run_shell, Cli, CliError, Command};
use gamesvc::config::ServiceConfig;
use gamesvc::data::{GameBackend, HttpBackend, MockBackend};

/// Installs the stderr log subscriber; `RUST_LOG` takes precedence over `-v`
fn init_logging(verbose: bool) {
    let filter = if verbose {
        "gamesvc=debug,warn"
    } else {
        "gamesvc=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Runs the parsed command against `api`
async fn run<B: GameBackend>(api: GameApi<B>, command: &Command) -> Result<(), CliError> {
    if *command == Command::Shell {
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        return run_shell(&api, input, &mut io::stdout(), &mut io::stderr()).await;
    }

    let output = execute(&api, command).await?;
    writeln!(io::stdout(), "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config: ServiceConfig = resolve_config(&cli)?;
    tracing::debug!(?config, "resolved configuration");

    match config.base_url.as_deref() {
        Some(base_url) => {
            let backend = HttpBackend::with_timeout(base_url, config.request_timeout())?;
            run(GameApi::new(backend, config.cache_ttl()), &cli.command).await?;
        }
        None => {
            let backend = MockBackend::new().with_latency(config.mock_latency());
            run(GameApi::new(backend, config.cache_ttl()), &cli.command).await?;
        }
    }

    Ok(())
}
