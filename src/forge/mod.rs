//! Git forge access
//!
//! The forge answers three questions about a repository: which tags it
//! has, which branches it has, and which commit a ref points at.

pub mod github;
pub mod resolve;

pub use github::GithubForge;
pub use resolve::{is_commit_sha, prefer_resolved_then_first, CandidateStrategy, Pick, RefResolver};

use crate::error::ShowcaseResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named ref and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    pub name: String,
    pub sha: String,
    pub url: String,
}

/// Read-only forge API
#[async_trait]
pub trait Forge: Send + Sync {
    /// List the repository's tags
    async fn list_tags(&self, org: &str, repo: &str) -> ShowcaseResult<Vec<RefEntry>>;

    /// List the repository's branches
    async fn list_branches(&self, org: &str, repo: &str) -> ShowcaseResult<Vec<RefEntry>>;

    /// Resolve any ref the forge understands to its commit
    async fn commit(&self, org: &str, repo: &str, reference: &str) -> ShowcaseResult<RefEntry>;
}
