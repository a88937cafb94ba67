//! Serve command - run the HTTP server

use crate::cli::args::ServeArgs;
use crate::cli::commands::with_cache_dir;
use crate::config::Config;
use crate::error::ShowcaseResult;
use crate::server;
use crate::showcase::Showcase;
use std::sync::Arc;
use tracing::warn;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> ShowcaseResult<()> {
    let config = with_cache_dir(config, args.cache_dir);
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    if config.forge.effective_token().is_none() {
        warn!("No forge token configured, unauthenticated API requests are heavily rate limited");
    }

    let showcase = Showcase::from_config(&config).await?;
    server::serve(Arc::new(showcase), &host, port).await
}
