//! Single-flight build coordination
//!
//! At most one builder per cache key, decided by [`CacheStore::claim`].
//! Everyone else polls for the artifact with capped exponential backoff.
//!
//! ```text
//! Unclaimed --claim--> Building --ok--> Ready
//!     ^                   |
//!     +----release--------+ (build failed)
//! ```
//!
//! A poller that finds the entry gone (the builder failed and released
//! it) tries to claim it again, so failures are never cached.
//!
//! A forced rebuild never deletes an entry out from under its builder. It
//! waits for any build in flight to settle, retires the ready entry, then
//! competes for the claim like any other caller.

use crate::cache::key::CacheKey;
use crate::cache::store::{CacheEntry, CacheStore, ClaimOutcome};
use crate::config::schema::CacheConfig;
use crate::error::{ShowcaseError, ShowcaseResult};
use crate::journal::BuildJournal;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How long and how often to wait for another builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// First delay between artifact checks
    pub interval: Duration,
    /// Backoff ceiling
    pub max_interval: Duration,
    /// Total wait before giving up; `None` waits forever
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        let interval = Duration::from_millis(config.poll_interval_ms.max(1));
        Self {
            interval,
            max_interval: Duration::from_millis(config.max_poll_interval_ms).max(interval),
            max_wait: config.max_wait(),
        }
    }

    /// Delay following `current`, doubled and capped
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_interval)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// Drives cache entries from unclaimed to ready
#[derive(Debug, Clone)]
pub struct BuildCoordinator {
    store: CacheStore,
    poll: PollPolicy,
    journal: BuildJournal,
}

impl BuildCoordinator {
    pub fn new(store: CacheStore, poll: PollPolicy, journal: BuildJournal) -> Self {
        Self {
            store,
            poll,
            journal,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Return the artifact for `key`, building it with `build` if this
    /// caller wins the claim.
    ///
    /// `build` runs at most once per call and only while the claim is held.
    /// It runs on its own task, so a dropped caller cannot strand a claim
    /// half-built. On failure the entry is released and the error is
    /// returned as [`ShowcaseError::Build`] to this caller only.
    pub async fn ensure_built<F, Fut>(&self, key: &CacheKey, build: F) -> ShowcaseResult<PathBuf>
    where
        F: FnOnce(CacheEntry) -> Fut + Send + 'static,
        Fut: Future<Output = ShowcaseResult<()>> + Send + 'static,
    {
        if let Some(path) = self.store.artifact(key).await? {
            debug!("Cache hit for {}", key);
            return Ok(path);
        }

        let started = Instant::now();
        let mut delay = self.poll.interval;
        let mut build = Some(build);

        loop {
            if self.store.claim(key).await? == ClaimOutcome::Claimed {
                let build = build.take().ok_or_else(|| {
                    ShowcaseError::Internal(format!("build for {} claimed twice", key))
                })?;
                return self.run_build(key, build).await;
            }

            debug!("Build for {} owned elsewhere, polling", key);
            loop {
                if let Some(path) = self.store.artifact(key).await? {
                    return Ok(path);
                }
                if !self.store.is_claimed(key).await? {
                    debug!("Entry {} released by its builder, retrying claim", key);
                    break;
                }
                delay = self.pause(key, started, delay).await?;
            }
        }
    }

    /// Replace any existing entry with a fresh build
    ///
    /// A build already in flight for `key` finishes first; its result is
    /// then retired and `build` competes for the claim.
    pub async fn rebuild<F, Fut>(&self, key: &CacheKey, build: F) -> ShowcaseResult<PathBuf>
    where
        F: FnOnce(CacheEntry) -> Fut + Send + 'static,
        Fut: Future<Output = ShowcaseResult<()>> + Send + 'static,
    {
        let started = Instant::now();
        let mut delay = self.poll.interval;
        while self.store.lock_retire(key).await? == ClaimOutcome::AlreadyExists {
            debug!("Entry {} is being retired elsewhere, waiting", key);
            delay = self.pause(key, started, delay).await?;
        }

        let retired = self.retire_settled(key, started, delay).await;
        if let Err(e) = self.store.unlock_retire(key).await {
            warn!("Failed to unlock cache entry {}: {}", key, e);
        }
        if retired? {
            info!("Retired cache entry {} for rebuild", key);
            self.journal
                .record("build.retired", &serde_json::json!({"key": key.as_str()}))
                .await;
        }

        self.ensure_built(key, build).await
    }

    /// Retire the entry once no builder is working on it. Caller holds
    /// the retire lock.
    async fn retire_settled(
        &self,
        key: &CacheKey,
        started: Instant,
        mut delay: Duration,
    ) -> ShowcaseResult<bool> {
        loop {
            if self.store.retire(key).await? {
                return Ok(true);
            }
            if !self.store.is_claimed(key).await? {
                return Ok(false);
            }
            debug!("Build for {} in flight, waiting before rebuild", key);
            delay = self.pause(key, started, delay).await?;
        }
    }

    /// Sleep for one poll step, or time out; returns the next delay
    async fn pause(
        &self,
        key: &CacheKey,
        started: Instant,
        delay: Duration,
    ) -> ShowcaseResult<Duration> {
        let waited = started.elapsed();
        let sleep_for = match self.poll.max_wait {
            Some(max) if waited >= max => return Err(self.timed_out(key, waited).await),
            Some(max) => delay.min(max - waited),
            None => delay,
        };

        tokio::time::sleep(sleep_for).await;
        Ok(self.poll.next_delay(delay))
    }

    async fn run_build<F, Fut>(&self, key: &CacheKey, build: F) -> ShowcaseResult<PathBuf>
    where
        F: FnOnce(CacheEntry) -> Fut + Send + 'static,
        Fut: Future<Output = ShowcaseResult<()>> + Send + 'static,
    {
        let build_id = Uuid::new_v4();
        let entry = self.store.entry(key);
        let store = self.store.clone();
        let journal = self.journal.clone();
        let task_key = key.clone();

        if let Err(e) = self.store.mark_building(key, build_id).await {
            if let Err(release) = self.store.release(key).await {
                warn!("Failed to release cache entry {}: {}", key, release);
            }
            return Err(e.into_build());
        }

        let task = tokio::spawn(async move {
            let key = task_key;
            info!("Building {} ({})", key, build_id);
            journal
                .record(
                    "build.claimed",
                    &serde_json::json!({"key": key.as_str(), "build_id": build_id}),
                )
                .await;

            let result = match build(entry).await {
                Ok(()) => match store.artifact(&key).await {
                    Ok(Some(path)) => store.settle(&key).await.map(|()| path),
                    Ok(None) => Err(ShowcaseError::build(
                        "build finished without producing a stylesheet",
                    )),
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };

            match result {
                Ok(path) => {
                    info!("Built {} ({})", key, build_id);
                    journal
                        .record(
                            "build.succeeded",
                            &serde_json::json!({"key": key.as_str(), "build_id": build_id}),
                        )
                        .await;
                    Ok(path)
                }
                Err(e) => {
                    let err = e.into_build();
                    warn!("Build {} failed: {}", key, err);
                    if let Err(release) = store.release(&key).await {
                        warn!("Failed to release cache entry {}: {}", key, release);
                    }
                    journal
                        .record(
                            "build.failed",
                            &serde_json::json!({
                                "key": key.as_str(),
                                "build_id": build_id,
                                "error": err.to_string(),
                            }),
                        )
                        .await;
                    Err(err)
                }
            }
        });

        match task.await {
            Ok(result) => result,
            Err(join) => {
                if let Err(release) = self.store.release(key).await {
                    warn!("Failed to release cache entry {}: {}", key, release);
                }
                Err(ShowcaseError::build(format!("build task aborted: {}", join)))
            }
        }
    }

    async fn timed_out(&self, key: &CacheKey, waited: Duration) -> ShowcaseError {
        warn!("Gave up waiting for {} after {:?}", key, waited);
        self.journal
            .record(
                "build.timeout",
                &serde_json::json!({"key": key.as_str(), "waited_ms": waited.as_millis() as u64}),
            )
            .await;
        ShowcaseError::BuildTimeout {
            key: key.to_string(),
            waited,
        }
    }
}
