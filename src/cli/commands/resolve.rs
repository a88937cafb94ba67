//! Resolve command - pin a ref to a commit

use crate::cache::CacheKey;
use crate::cli::args::ThemeArgs;
use crate::config::Config;
use crate::error::ShowcaseResult;
use crate::forge::{GithubForge, RefResolver};
use crate::server::stylesheet_url;
use crate::ui::{self, UiContext};
use std::sync::Arc;

/// Execute the resolve command
///
/// The commit goes to stdout; key and URL are labelled lines on stderr.
pub async fn execute(args: ThemeArgs, config: &Config) -> ShowcaseResult<()> {
    CacheKey::check_names(&args.org, &args.repo)?;

    let resolver = RefResolver::new(Arc::new(GithubForge::new(&config.forge)));
    let sha = resolver.resolve(&args.org, &args.repo, &args.reference).await?;
    let key = CacheKey::derive(&args.org, &args.repo, &sha)?;

    let ctx = UiContext::detect();
    ui::key_value(&ctx, "ref", &args.reference);
    ui::key_value(&ctx, "key", key.as_str());
    ui::key_value(&ctx, "url", &stylesheet_url(&args.org, &args.repo, &sha));
    println!("{}", sha);
    Ok(())
}
