//! Showcase - theme stylesheet build cache
//!
//! Resolves `org/repo@ref` on a git forge to a commit, builds the theme's
//! stylesheet once per commit, and serves it from a content-addressed
//! on-disk cache. Concurrent requests for the same commit share one build.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod forge;
pub mod journal;
pub mod render;
pub mod server;
pub mod showcase;
pub mod ui;

pub use error::{ShowcaseError, ShowcaseResult};
pub use showcase::{ResolvedTheme, Showcase};
