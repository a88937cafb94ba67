//! Key command - derive a cache key offline

use crate::cache::CacheKey;
use crate::cli::args::KeyArgs;
use crate::error::ShowcaseResult;
use crate::forge::is_commit_sha;
use tracing::warn;

/// Execute the key command
pub fn execute(args: KeyArgs) -> ShowcaseResult<()> {
    if !is_commit_sha(&args.sha) {
        warn!(
            "'{}' is not a full commit hash; keys for symbolic refs go stale",
            args.sha
        );
    }

    let key = CacheKey::derive(&args.org, &args.repo, &args.sha)?;
    println!("{}", key);
    Ok(())
}
