//! Configuration schema for Showcase
//!
//! Configuration is stored at `~/.config/showcase/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Build cache settings
    pub cache: CacheConfig,

    /// Git forge API settings
    pub forge: ForgeConfig,

    /// Stylesheet build command
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append build events to `<cache root>/journal.log`
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: true,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Build cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory (defaults to the platform cache dir)
    pub root: Option<PathBuf>,

    /// Initial delay between artifact polls
    pub poll_interval_ms: u64,

    /// Upper bound for the poll backoff
    pub max_poll_interval_ms: u64,

    /// Give up waiting on another builder after N seconds (0 = never)
    pub max_wait_secs: u64,
}

impl CacheConfig {
    /// Resolve the cache root, falling back to the platform cache directory
    pub fn root_dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("showcase")
        })
    }

    pub fn max_wait(&self) -> Option<Duration> {
        (self.max_wait_secs > 0).then(|| Duration::from_secs(self.max_wait_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            poll_interval_ms: 1000,
            max_poll_interval_ms: 8000,
            max_wait_secs: 300,
        }
    }
}

/// Git forge API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// API base URL (GitHub Enterprise uses `https://<host>/api/v3`)
    pub api_url: String,

    /// API token; `GITHUB_TOKEN` is used when unset
    pub token: Option<String>,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl ForgeConfig {
    /// Token from config, falling back to the environment
    pub fn effective_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            user_agent: format!("showcase/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 15,
        }
    }
}

/// External stylesheet build command
///
/// Arguments may contain `{descriptor}`, `{output}`, `{dir}`,
/// `{dependency}` and `{sha}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Program to run
    pub program: String,

    /// Program arguments
    pub args: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: "poe-ui-builder".to_string(),
            args: vec![
                "--manifest".to_string(),
                "{descriptor}".to_string(),
                "--out".to_string(),
                "{output}".to_string(),
            ],
        }
    }
}
