//! GitHub REST API forge
//!
//! Uses a blocking `ureq` agent on tokio's blocking pool.

use crate::config::schema::ForgeConfig;
use crate::error::{ShowcaseError, ShowcaseResult};
use crate::forge::{Forge, RefEntry};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 10;

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
    url: String,
}

/// Entry of `/tags` and `/branches`
#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
    commit: CommitRef,
}

impl From<NamedRef> for RefEntry {
    fn from(r: NamedRef) -> Self {
        Self {
            name: r.name,
            sha: r.commit.sha,
            url: r.commit.url,
        }
    }
}

/// Forge backed by the GitHub REST API
#[derive(Clone)]
pub struct GithubForge {
    agent: Agent,
    api_url: String,
    token: Option<String>,
    user_agent: String,
}

impl std::fmt::Debug for GithubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubForge")
            .field("api_url", &self.api_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl GithubForge {
    /// Create a client from forge configuration
    pub fn new(config: &ForgeConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs.max(1))))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(agent_config),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.effective_token(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn repo_url(&self, org: &str, repo: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url,
            encode_segment(org),
            encode_segment(repo),
            path
        )
    }

    /// GET a JSON document, mapping non-2xx responses to resolution errors
    async fn get_json<T>(&self, url: String) -> ShowcaseResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        let token = self.token.clone();
        let user_agent = self.user_agent.clone();

        tokio::task::spawn_blocking(move || {
            debug!("GET {}", url);

            let mut request = agent
                .get(&url)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", &user_agent);
            if let Some(token) = token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }

            let mut response = request
                .call()
                .map_err(|e| ShowcaseError::Forge(format!("GET {}: {}", url, e)))?;
            let status = response.status();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ShowcaseError::Forge(format!("reading {}: {}", url, e)))?;

            if !status.is_success() {
                return Err(ShowcaseError::Resolution {
                    status: status.as_u16(),
                    message: error_message(&body, status.canonical_reason()),
                });
            }

            Ok(serde_json::from_str(&body)?)
        })
        .await
        .map_err(|e| ShowcaseError::Internal(format!("forge request task failed: {}", e)))?
    }

    async fn list_named(&self, org: &str, repo: &str, kind: &str) -> ShowcaseResult<Vec<RefEntry>> {
        let mut entries = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = self.repo_url(
                org,
                repo,
                &format!("{}?per_page={}&page={}", kind, PER_PAGE, page),
            );
            let batch: Vec<NamedRef> = self.get_json(url).await?;
            let done = batch.len() < PER_PAGE;
            entries.extend(batch.into_iter().map(RefEntry::from));
            if done {
                break;
            }
        }

        debug!("{}/{} has {} {}", org, repo, entries.len(), kind);
        Ok(entries)
    }
}

/// Percent-encode one URL path segment, keeping only unreserved bytes
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Extract GitHub's `message` field, falling back to the status reason
fn error_message(body: &str, reason: Option<&str>) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }

    serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| reason.unwrap_or("unknown error").to_string())
}

#[async_trait]
impl Forge for GithubForge {
    async fn list_tags(&self, org: &str, repo: &str) -> ShowcaseResult<Vec<RefEntry>> {
        self.list_named(org, repo, "tags").await
    }

    async fn list_branches(&self, org: &str, repo: &str) -> ShowcaseResult<Vec<RefEntry>> {
        self.list_named(org, repo, "branches").await
    }

    async fn commit(&self, org: &str, repo: &str, reference: &str) -> ShowcaseResult<RefEntry> {
        let url = self.repo_url(org, repo, &format!("commits/{}", encode_segment(reference)));
        let commit: CommitRef = self.get_json(url).await?;
        Ok(RefEntry {
            name: reference.to_string(),
            sha: commit.sha,
            url: commit.url,
        })
    }
}
