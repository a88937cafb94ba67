//! CLI command implementations

pub mod build;
pub mod cache;
pub mod completions;
pub mod config;
pub mod key;
pub mod refs;
pub mod resolve;
pub mod serve;

pub use build::execute as build;
pub use cache::execute as cache;
pub use completions::execute as completions;
pub use config::execute as config;
pub use key::execute as key;
pub use refs::execute as refs;
pub use resolve::execute as resolve;
pub use serve::execute as serve;

use crate::config::Config;
use std::path::PathBuf;

/// Config with a command-line cache directory applied
pub(crate) fn with_cache_dir(config: &Config, cache_dir: Option<PathBuf>) -> Config {
    let mut config = config.clone();
    if let Some(dir) = cache_dir {
        config.cache.root = Some(dir);
    }
    config
}

/// First 12 characters of a commit hash
pub(crate) fn short_sha(sha: &str) -> &str {
    &sha[..sha.len().min(12)]
}
