//! Theme stylesheet pipeline
//!
//! request -> resolve ref -> derive key -> claim or poll -> artifact

use crate::build::{BuildExecutor, CommandCompiler};
use crate::cache::{BuildCoordinator, CacheEntry, CacheKey, CacheStore, PollPolicy};
use crate::config::Config;
use crate::error::ShowcaseResult;
use crate::forge::{GithubForge, RefResolver};
use crate::journal::BuildJournal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// A theme pinned to a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTheme {
    pub org: String,
    pub repo: String,
    pub sha: String,
    pub key: CacheKey,
}

/// Resolves themes and serves their cached stylesheets
#[derive(Debug, Clone)]
pub struct Showcase {
    resolver: RefResolver,
    coordinator: BuildCoordinator,
    executor: BuildExecutor,
}

impl Showcase {
    pub fn new(
        resolver: RefResolver,
        coordinator: BuildCoordinator,
        executor: BuildExecutor,
    ) -> Self {
        Self {
            resolver,
            coordinator,
            executor,
        }
    }

    /// Wire the GitHub forge, command compiler and on-disk cache from config
    pub async fn from_config(config: &Config) -> ShowcaseResult<Self> {
        let store = CacheStore::open(config.cache.root_dir()).await?;
        let journal = BuildJournal::new(store.root(), config.general.journal);
        let coordinator =
            BuildCoordinator::new(store, PollPolicy::from_config(&config.cache), journal);

        let resolver = RefResolver::new(Arc::new(GithubForge::new(&config.forge)));
        let executor = BuildExecutor::new(Arc::new(CommandCompiler::from_config(&config.build)));

        Ok(Self::new(resolver, coordinator, executor))
    }

    pub fn store(&self) -> &CacheStore {
        self.coordinator.store()
    }

    /// Pin `reference` to a commit and derive its cache key
    pub async fn resolve(
        &self,
        org: &str,
        repo: &str,
        reference: &str,
    ) -> ShowcaseResult<ResolvedTheme> {
        CacheKey::check_names(org, repo)?;
        let sha = self.resolver.resolve(org, repo, reference).await?;
        let key = CacheKey::derive(org, repo, &sha)?;
        debug!("{}/{}@{} -> {} ({})", org, repo, reference, sha, key);

        Ok(ResolvedTheme {
            org: org.to_string(),
            repo: repo.to_string(),
            sha,
            key,
        })
    }

    /// Path of the built stylesheet for `reference`, building it if needed
    pub async fn stylesheet(
        &self,
        org: &str,
        repo: &str,
        reference: &str,
    ) -> ShowcaseResult<PathBuf> {
        let theme = self.resolve(org, repo, reference).await?;
        self.ensure(&theme, false).await
    }

    /// Discard any cached build for `reference` and build it again
    pub async fn rebuild(
        &self,
        org: &str,
        repo: &str,
        reference: &str,
    ) -> ShowcaseResult<PathBuf> {
        let theme = self.resolve(org, repo, reference).await?;
        self.ensure(&theme, true).await
    }

    /// Build an already resolved theme
    pub async fn ensure(&self, theme: &ResolvedTheme, force: bool) -> ShowcaseResult<PathBuf> {
        let executor = self.executor.clone();
        let (org, repo, sha) = (theme.org.clone(), theme.repo.clone(), theme.sha.clone());
        let build = move |entry: CacheEntry| async move {
            executor.execute(&entry, &org, &repo, &sha).await
        };

        if force {
            self.coordinator.rebuild(&theme.key, build).await
        } else {
            self.coordinator.ensure_built(&theme.key, build).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::executor::tests::FakeCompiler;
    use crate::cache::ComponentDescriptor;
    use crate::error::ShowcaseError;
    use crate::forge::resolve::tests::{FakeForge, MASTER_SHA};
    use crate::render::render_error;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::TempDir;

    const SHA: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    struct Fixture {
        showcase: Showcase,
        forge: Arc<FakeForge>,
        compiler: Arc<FakeCompiler>,
        _temp: TempDir,
    }

    async fn fixture(compiler: FakeCompiler) -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::open(temp.path().join("cache")).await.unwrap();
        let poll = PollPolicy {
            interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(20),
            max_wait: Some(Duration::from_secs(10)),
        };
        let coordinator = BuildCoordinator::new(store, poll, BuildJournal::disabled());
        let forge = Arc::new(FakeForge::with_master());
        let compiler = Arc::new(compiler);

        let showcase = Showcase::new(
            RefResolver::new(forge.clone()),
            coordinator,
            BuildExecutor::new(compiler.clone()),
        );
        Fixture {
            showcase,
            forge,
            compiler,
            _temp: temp,
        }
    }

    #[tokio::test]
    async fn commit_hash_keys_directly() {
        let f = fixture(FakeCompiler::css("a{}")).await;

        let theme = f.showcase.resolve("acme", "theme", SHA).await.unwrap();

        assert_eq!(theme.sha, SHA);
        assert_eq!(theme.key, CacheKey::derive("acme", "theme", SHA).unwrap());
        assert_eq!(f.forge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn branch_builds_resolved_commit() {
        let f = fixture(FakeCompiler::css("a{b:c}")).await;

        let path = f.showcase.stylesheet("acme", "theme", "master").await.unwrap();

        let entry = f
            .showcase
            .store()
            .entry(&CacheKey::derive("acme", "theme", MASTER_SHA).unwrap());
        assert_eq!(path, entry.artifact_path());

        let descriptor: ComponentDescriptor =
            serde_json::from_str(&std::fs::read_to_string(entry.descriptor_path()).unwrap())
                .unwrap();
        assert_eq!(descriptor.dependency(), Some(("acme/theme", MASTER_SHA)));
    }

    #[tokio::test]
    async fn failed_build_renders_css_and_rolls_back() {
        let f = fixture(FakeCompiler::failing("missing index file")).await;

        let err = f.showcase.stylesheet("acme", "theme", SHA).await.unwrap_err();

        assert_eq!(
            render_error(&err),
            "body:before{white-space: pre; content:\"missing index file\";}"
        );
        let key = CacheKey::derive("acme", "theme", SHA).unwrap();
        assert!(!f.showcase.store().is_claimed(&key).await.unwrap());
    }

    #[tokio::test]
    async fn repeated_requests_compile_once() {
        let f = fixture(FakeCompiler::css("a{}")).await;

        let first = f.showcase.stylesheet("acme", "theme", SHA).await.unwrap();
        let second = f.showcase.stylesheet("acme", "theme", SHA).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.compiler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn commit_hash_case_shares_one_build() {
        let f = fixture(FakeCompiler::css("a{}")).await;

        let lower = f.showcase.stylesheet("acme", "theme", SHA).await.unwrap();
        let upper = f
            .showcase
            .stylesheet("acme", "theme", &SHA.to_ascii_uppercase())
            .await
            .unwrap();

        assert_eq!(lower, upper);
        assert_eq!(f.compiler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rebuild_compiles_again() {
        let f = fixture(FakeCompiler::css("a{}")).await;

        f.showcase.stylesheet("acme", "theme", SHA).await.unwrap();
        f.showcase.rebuild("acme", "theme", SHA).await.unwrap();

        assert_eq!(f.compiler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalid_names_rejected_before_forge() {
        let f = fixture(FakeCompiler::css("a{}")).await;

        let err = f.showcase.stylesheet("", "theme", "master").await.unwrap_err();

        assert!(matches!(err, ShowcaseError::InvalidKeyInput(_)));
        assert_eq!(f.forge.calls.load(Ordering::SeqCst), 0);
    }
}
