//! Build event journal
//!
//! Writes JSON lines to `<cache root>/journal.log`, one per build event.
//! Shared by every process using the same cache root.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub const JOURNAL_FILE: &str = "journal.log";

/// File-based journal that appends JSON lines
#[derive(Debug, Clone)]
pub struct BuildJournal {
    enabled: bool,
    path: PathBuf,
}

impl BuildJournal {
    /// Journal stored under the given cache root
    pub fn new(cache_root: &Path, enabled: bool) -> Self {
        Self {
            enabled,
            path: cache_root.join(JOURNAL_FILE),
        }
    }

    /// Journal that records nothing
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event as a JSON line
    ///
    /// IO failures are logged and dropped; a build never fails because
    /// the journal could not be written.
    pub async fn record(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "pid": std::process::id(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write build journal: {}", e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
