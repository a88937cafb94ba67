//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Showcase - theme stylesheet build cache
///
/// Resolves a theme repository ref to a commit, builds its stylesheet
/// once, and serves it from an on-disk cache.
#[derive(Parser, Debug)]
#[command(name = "showcase")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHOWCASE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve stylesheets over HTTP
    Serve(ServeArgs),

    /// Build a theme and print its stylesheet
    Build(BuildArgs),

    /// Resolve a ref to a commit and cache key
    Resolve(ThemeArgs),

    /// List a repository's tags and branches
    Refs(RefsArgs),

    /// Derive the cache key for a commit
    Key(KeyArgs),

    /// Inspect or clear the stylesheet cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind (default: from config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default: from config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Cache directory (default: from config)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// A theme repository and ref
#[derive(Parser, Debug)]
pub struct ThemeArgs {
    /// Organization or user owning the repository
    pub org: String,

    /// Repository name
    pub repo: String,

    /// Branch, tag or commit hash
    #[arg(default_value = "master")]
    pub reference: String,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub theme: ThemeArgs,

    /// Discard any cached build and compile again
    #[arg(short, long)]
    pub force: bool,

    /// Cache directory (default: from config)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the refs command
#[derive(Parser, Debug)]
pub struct RefsArgs {
    /// Organization or user owning the repository
    pub org: String,

    /// Repository name
    pub repo: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Organization or user owning the repository
    pub org: String,

    /// Repository name
    pub repo: String,

    /// Commit hash
    pub sha: String,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache entries
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the cache directory
    Path,

    /// Remove built entries (in-flight builds are kept)
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., server.port)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
