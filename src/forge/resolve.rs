//! Ref resolution
//!
//! Turns a branch or tag name into the commit it currently points at.
//! Everything downstream of the resolver sees only commit hashes, so the
//! cache never keys on a name that can move.
//!
//! Resolution order for a symbolic name:
//! 1. Collect candidates: tags, then branches, whose name matches
//! 2. No candidate: ask the forge's commit endpoint directly
//! 3. One candidate: resolve it as a commit
//! 4. Several (a tag and a branch sharing a name): let the
//!    [`CandidateStrategy`] pick

use crate::error::{ShowcaseError, ShowcaseResult};
use crate::forge::{Forge, RefEntry};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::sync::Arc;
use tracing::debug;

/// Nested resolutions allowed before giving up
const MAX_DEPTH: usize = 8;

/// Whether `reference` is a full 40-character hex commit hash
pub fn is_commit_sha(reference: &str) -> bool {
    reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit())
}

/// Decision taken among several candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    /// Use this commit hash
    Resolved(String),
    /// Resolve this name instead
    Follow(String),
}

/// Chooses among ambiguous candidates; never called with fewer than two
pub type CandidateStrategy = fn(&[RefEntry]) -> Pick;

/// First candidate already pointing at a commit hash, else follow the
/// first candidate's target
pub fn prefer_resolved_then_first(candidates: &[RefEntry]) -> Pick {
    if let Some(entry) = candidates.iter().find(|c| is_commit_sha(&c.sha)) {
        return Pick::Resolved(entry.sha.clone());
    }
    match candidates.first() {
        Some(entry) => Pick::Follow(entry.sha.clone()),
        None => Pick::Follow(String::new()),
    }
}

/// Resolves refs against a [`Forge`]
#[derive(Clone)]
pub struct RefResolver {
    forge: Arc<dyn Forge>,
    strategy: CandidateStrategy,
}

impl RefResolver {
    pub fn new(forge: Arc<dyn Forge>) -> Self {
        Self {
            forge,
            strategy: prefer_resolved_then_first,
        }
    }

    /// Replace the tie-break used for ambiguous names
    pub fn with_strategy(mut self, strategy: CandidateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Resolve `reference` to a lowercase commit hash
    ///
    /// Commit hashes are returned without touching the forge.
    pub async fn resolve(&self, org: &str, repo: &str, reference: &str) -> ShowcaseResult<String> {
        let sha = if is_commit_sha(reference) {
            reference.to_string()
        } else {
            self.resolve_named(org.to_string(), repo.to_string(), reference.to_string(), 0)
                .await?
        };
        // Hex is case-insensitive, cache keys are not
        Ok(sha.to_ascii_lowercase())
    }

    /// Tags then branches whose name equals `reference`
    pub async fn candidates(
        &self,
        org: &str,
        repo: &str,
        reference: &str,
    ) -> ShowcaseResult<Vec<RefEntry>> {
        let tags = self.forge.list_tags(org, repo).await?;
        let branches = self.forge.list_branches(org, repo).await?;

        Ok(tags
            .into_iter()
            .chain(branches)
            .filter(|entry| entry.name == reference)
            .collect())
    }

    fn resolve_named(
        &self,
        org: String,
        repo: String,
        reference: String,
        depth: usize,
    ) -> BoxFuture<'_, ShowcaseResult<String>> {
        async move {
            if is_commit_sha(&reference) {
                return Ok(reference);
            }
            if reference.is_empty() {
                return Err(ShowcaseError::Resolution {
                    status: 404,
                    message: format!("empty ref in {}/{}", org, repo),
                });
            }
            if depth >= MAX_DEPTH {
                return Err(ShowcaseError::Resolution {
                    status: 508,
                    message: format!(
                        "ref {} in {}/{} did not resolve after {} steps",
                        reference, org, repo, MAX_DEPTH
                    ),
                });
            }

            let candidates = self.candidates(&org, &repo, &reference).await?;
            debug!(
                "{}/{}@{} has {} candidate(s)",
                org,
                repo,
                reference,
                candidates.len()
            );

            match candidates.as_slice() {
                [] => Ok(self.forge.commit(&org, &repo, &reference).await?.sha),
                [single] => Ok(self.forge.commit(&org, &repo, &single.sha).await?.sha),
                many => match (self.strategy)(many) {
                    Pick::Resolved(sha) => Ok(sha),
                    Pick::Follow(next) => self.resolve_named(org, repo, next, depth + 1).await,
                },
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for RefResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefResolver").finish_non_exhaustive()
    }
}
