//! Build executor
//!
//! Runs once per successful claim: pins the dependency in a descriptor,
//! runs the compiler, then promotes its output to the artifact path.

use crate::build::compiler::{CompileJob, StyleCompiler};
use crate::cache::store::{CacheEntry, ComponentDescriptor};
use crate::error::{ShowcaseError, ShowcaseResult};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Builds one cache entry with a [`StyleCompiler`]
#[derive(Clone)]
pub struct BuildExecutor {
    compiler: Arc<dyn StyleCompiler>,
}

impl BuildExecutor {
    pub fn new(compiler: Arc<dyn StyleCompiler>) -> Self {
        Self { compiler }
    }

    /// Build `org/repo` at `sha` into `entry`
    ///
    /// Leaves no artifact behind on failure; the caller releases the entry.
    pub async fn execute(
        &self,
        entry: &CacheEntry,
        org: &str,
        repo: &str,
        sha: &str,
    ) -> ShowcaseResult<()> {
        let descriptor = ComponentDescriptor::pinned(&entry.key, org, repo, sha);
        let descriptor_path = entry.descriptor_path();
        let content = serde_json::to_string_pretty(&descriptor)?;
        fs::write(&descriptor_path, content).await.map_err(|e| {
            ShowcaseError::io(format!("writing {}", descriptor_path.display()), e)
        })?;
        debug!("Wrote descriptor {}", descriptor_path.display());

        let job = CompileJob {
            workdir: entry.dir.clone(),
            descriptor: descriptor_path,
            output: entry.partial_path(),
            dependency: format!("{}/{}", org, repo),
            sha: sha.to_string(),
        };

        info!(
            "Compiling {}@{} with {}",
            job.dependency,
            &sha[..sha.len().min(12)],
            self.compiler.name()
        );
        self.compiler.compile(&job).await?;

        match fs::metadata(&job.output).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(ShowcaseError::build(format!(
                    "{} did not write {}",
                    self.compiler.name(),
                    job.output.display()
                )))
            }
        }

        let artifact = entry.artifact_path();
        fs::rename(&job.output, &artifact)
            .await
            .map_err(|e| ShowcaseError::io(format!("promoting {}", artifact.display()), e))?;

        Ok(())
    }
}

impl std::fmt::Debug for BuildExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildExecutor")
            .field("compiler", &self.compiler.name())
            .finish()
    }
}
