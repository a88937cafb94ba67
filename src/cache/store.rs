//! On-disk cache entries and exclusive claims
//!
//! Each entry is a directory named after its [`CacheKey`]. Creating that
//! directory is the claim: `create_dir` either succeeds for exactly one
//! caller or fails with `AlreadyExists`, across threads and processes that
//! share the same root.
//!
//! While its builder runs, an entry holds a [`BUILDING_FILE`] marker. A
//! ready entry is only removed by retiring it: under a per-key retire
//! lock, and only once the marker is gone, the directory is renamed to a
//! tombstone and deleted. A running builder therefore never loses its
//! directory to a rebuild or a cache clear.

use crate::cache::key::CacheKey;
use crate::error::{ShowcaseError, ShowcaseResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Dependency descriptor file inside an entry
pub const DESCRIPTOR_FILE: &str = "component.json";
/// Built stylesheet inside an entry
pub const ARTIFACT_FILE: &str = "build.css";
/// Compiler output, promoted to [`ARTIFACT_FILE`] once complete
pub const PARTIAL_FILE: &str = "build.css.partial";
/// Present while the entry's builder is still running; holds its build id
pub const BUILDING_FILE: &str = ".building";

const RETIRE_LOCK_SUFFIX: &str = ".retire";

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Result of trying to claim a cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller created the entry and is now its only builder
    Claimed,
    /// Another caller owns the entry (building or already built)
    AlreadyExists,
}

/// Observable state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Entry claimed, artifact not written yet
    Building,
    /// Artifact present
    Ready,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "building"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Dependency descriptor handed to the stylesheet compiler
///
/// Names a single dependency, `org/repo`, pinned to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub name: String,
    pub dependencies: BTreeMap<String, String>,
}

impl ComponentDescriptor {
    pub fn pinned(key: &CacheKey, org: &str, repo: &str, sha: &str) -> Self {
        let mut dependencies = BTreeMap::new();
        dependencies.insert(format!("{}/{}", org, repo), sha.to_string());
        Self {
            name: format!("showcase-{}", &key.as_str()[..12]),
            dependencies,
        }
    }

    /// The single pinned dependency, as `("org/repo", sha)`
    pub fn dependency(&self) -> Option<(&str, &str)> {
        self.dependencies
            .iter()
            .next()
            .map(|(name, sha)| (name.as_str(), sha.as_str()))
    }
}

/// Paths of one cache entry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub dir: PathBuf,
}

impl CacheEntry {
    pub fn descriptor_path(&self) -> PathBuf {
        self.dir.join(DESCRIPTOR_FILE)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    pub fn partial_path(&self) -> PathBuf {
        self.dir.join(PARTIAL_FILE)
    }
}

/// Summary of an entry for listings
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub key: String,
    pub state: CacheState,
    pub descriptor: Option<ComponentDescriptor>,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: Option<u64>,
}

/// Cache entries under a single root directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open a store, creating the root directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> ShowcaseResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            ShowcaseError::io(format!("creating cache root {}", root.display()), e)
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry(&self, key: &CacheKey) -> CacheEntry {
        CacheEntry {
            key: key.clone(),
            dir: self.root.join(key.as_str()),
        }
    }

    /// Atomically create the entry directory if it does not exist
    pub async fn claim(&self, key: &CacheKey) -> ShowcaseResult<ClaimOutcome> {
        let dir = self.root.join(key.as_str());
        match fs::create_dir(&dir).await {
            Ok(()) => {
                debug!("Claimed cache entry {}", key);
                Ok(ClaimOutcome::Claimed)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(ClaimOutcome::AlreadyExists),
            Err(e) => Err(ShowcaseError::io(
                format!("creating cache entry {}", dir.display()),
                e,
            )),
        }
    }

    /// Remove an entry so the key can be claimed again
    pub async fn release(&self, key: &CacheKey) -> ShowcaseResult<()> {
        let dir = self.root.join(key.as_str());
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Released cache entry {}", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ShowcaseError::io(
                format!("removing cache entry {}", dir.display()),
                e,
            )),
        }
    }

    /// Mark a claimed entry as owned by a running build
    pub async fn mark_building(&self, key: &CacheKey, build_id: Uuid) -> ShowcaseResult<()> {
        let path = self.entry(key).dir.join(BUILDING_FILE);
        fs::write(&path, build_id.to_string())
            .await
            .map_err(|e| ShowcaseError::io(format!("writing {}", path.display()), e))
    }

    /// Clear the building marker once the builder is done with the entry
    pub async fn settle(&self, key: &CacheKey) -> ShowcaseResult<()> {
        let path = self.entry(key).dir.join(BUILDING_FILE);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ShowcaseError::io(format!("removing {}", path.display()), e)),
        }
    }

    /// Take the per-key lock required to retire an entry
    pub async fn lock_retire(&self, key: &CacheKey) -> ShowcaseResult<ClaimOutcome> {
        let dir = self.retire_lock_dir(key);
        match fs::create_dir(&dir).await {
            Ok(()) => Ok(ClaimOutcome::Claimed),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(ClaimOutcome::AlreadyExists),
            Err(e) => Err(ShowcaseError::io(
                format!("creating retire lock {}", dir.display()),
                e,
            )),
        }
    }

    pub async fn unlock_retire(&self, key: &CacheKey) -> ShowcaseResult<()> {
        let dir = self.retire_lock_dir(key);
        match fs::remove_dir(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ShowcaseError::io(
                format!("removing retire lock {}", dir.display()),
                e,
            )),
        }
    }

    /// Remove a settled ready entry. The caller must hold the retire lock.
    ///
    /// Returns `false`, touching nothing, when the entry is missing, still
    /// building, or its builder has not settled yet.
    pub async fn retire(&self, key: &CacheKey) -> ShowcaseResult<bool> {
        let entry = self.entry(key);
        if self.artifact(key).await?.is_none() {
            return Ok(false);
        }
        let marker = entry.dir.join(BUILDING_FILE);
        if fs::try_exists(&marker)
            .await
            .map_err(|e| ShowcaseError::io(format!("checking {}", marker.display()), e))?
        {
            return Ok(false);
        }

        let tombstone = self
            .root
            .join(format!("{}.{}.retired", key.as_str(), Uuid::new_v4()));
        match fs::rename(&entry.dir, &tombstone).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(ShowcaseError::io(
                    format!("retiring cache entry {}", entry.dir.display()),
                    e,
                ))
            }
        }
        fs::remove_dir_all(&tombstone).await.map_err(|e| {
            ShowcaseError::io(format!("removing {}", tombstone.display()), e)
        })?;
        debug!("Retired cache entry {}", key);
        Ok(true)
    }

    fn retire_lock_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}{}", key.as_str(), RETIRE_LOCK_SUFFIX))
    }

    /// Whether the entry directory exists
    pub async fn is_claimed(&self, key: &CacheKey) -> ShowcaseResult<bool> {
        let dir = self.root.join(key.as_str());
        fs::try_exists(&dir)
            .await
            .map_err(|e| ShowcaseError::io(format!("checking {}", dir.display()), e))
    }

    /// Path of the built artifact, if it has been written
    pub async fn artifact(&self, key: &CacheKey) -> ShowcaseResult<Option<PathBuf>> {
        let path = self.entry(key).artifact_path();
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ShowcaseError::io(format!("reading {}", path.display()), e)),
        }
    }

    /// List all entries under the root
    pub async fn list(&self) -> ShowcaseResult<Vec<EntryInfo>> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| ShowcaseError::io("reading cache root", e))?;

        let mut infos = Vec::new();
        while let Some(dirent) = entries
            .next_entry()
            .await
            .map_err(|e| ShowcaseError::io("reading cache entry", e))?
        {
            let Some(name) = dirent.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let is_dir = dirent
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir || CacheKey::from_digest(&name).is_err() {
                continue;
            }
            infos.push(Self::inspect(name, &dirent.path()).await);
        }

        infos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(infos)
    }

    /// Retire every ready entry, leaving in-flight builds untouched
    ///
    /// Entries whose retire lock is held elsewhere are skipped.
    pub async fn clear_ready(&self) -> ShowcaseResult<Vec<EntryInfo>> {
        let mut removed = Vec::new();
        for info in self.list().await? {
            if info.state != CacheState::Ready {
                continue;
            }
            let key = CacheKey::from_digest(&info.key)?;
            if self.lock_retire(&key).await? == ClaimOutcome::AlreadyExists {
                debug!("Skipping {}, retire lock held", key);
                continue;
            }
            let retired = self.retire(&key).await;
            self.unlock_retire(&key).await?;
            if retired? {
                removed.push(info);
            }
        }
        Ok(removed)
    }

    async fn inspect(key: String, dir: &Path) -> EntryInfo {
        let created_at = fs::metadata(dir)
            .await
            .ok()
            .and_then(|m| m.created().or_else(|_| m.modified()).ok())
            .map(DateTime::<Utc>::from);

        let descriptor = match fs::read_to_string(dir.join(DESCRIPTOR_FILE)).await {
            Ok(content) => serde_json::from_str(&content).ok(),
            Err(_) => None,
        };

        let artifact = fs::metadata(dir.join(ARTIFACT_FILE)).await.ok();
        let (state, size_bytes) = match artifact {
            Some(meta) => (CacheState::Ready, Some(meta.len())),
            None => (CacheState::Building, None),
        };

        EntryInfo {
            key,
            state,
            descriptor,
            created_at,
            size_bytes,
        }
    }
}
