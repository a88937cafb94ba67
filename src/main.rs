//! Showcase - theme stylesheet build cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use showcase::cli::{Cli, Commands};
use showcase::config::{Config, ConfigManager};
use showcase::error::ShowcaseResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e.diagnostic());
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ShowcaseResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions(args) = cli.command {
        showcase::cli::commands::completions(args);
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    let serving = matches!(cli.command, Commands::Serve(_));
    init_logging(cli.verbose, serving, &config);
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Completions(_) => unreachable!("Completions handled above"),
        Commands::Serve(args) => showcase::cli::commands::serve(args, &config).await,
        Commands::Build(args) => showcase::cli::commands::build(args, &config).await,
        Commands::Resolve(args) => showcase::cli::commands::resolve(args, &config).await,
        Commands::Refs(args) => showcase::cli::commands::refs(args, &config).await,
        Commands::Key(args) => showcase::cli::commands::key(args),
        Commands::Cache(args) => showcase::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            showcase::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `RUST_LOG` wins when no -v is given
///
/// The server starts one level up so request handling is visible.
fn init_logging(verbose: u8, serving: bool, config: &Config) {
    let fallback = match verbose.saturating_add(u8::from(serving)) {
        0 => "showcase=warn",
        1 => "showcase=info",
        _ => "showcase=debug",
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    } else {
        EnvFilter::new(fallback)
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.with_target(false).without_time().init();
    }
}
