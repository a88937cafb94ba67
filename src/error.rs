//! Error types for Showcase
//!
//! All modules use `ShowcaseResult<T>` as their return type.

use std::error::Error as _;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for Showcase operations
pub type ShowcaseResult<T> = Result<T, ShowcaseError>;

/// All errors that can occur in Showcase
#[derive(Error, Debug)]
pub enum ShowcaseError {
    // Reference resolution errors
    #[error("Forge lookup failed ({status}): {message}")]
    Resolution { status: u16, message: String },

    #[error("Forge request failed: {0}")]
    Forge(String),

    // Cache errors
    #[error("Invalid cache key input: {0}")]
    InvalidKeyInput(String),

    #[error("{message}")]
    Build { message: String },

    #[error("Timed out after {}s waiting for build {key}", .waited.as_secs())]
    BuildTimeout { key: String, waited: Duration },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShowcaseError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }

    /// Wrap any error raised while a build was in progress.
    ///
    /// Build failures are rendered to the requester as CSS, so the full
    /// diagnostic text is captured here.
    pub fn into_build(self) -> Self {
        match self {
            Self::Build { .. } => self,
            other => Self::build(other.diagnostic()),
        }
    }

    /// Whether the HTTP layer renders this error as a diagnostic stylesheet
    pub fn is_build_failure(&self) -> bool {
        matches!(self, Self::Build { .. } | Self::BuildTimeout { .. })
    }

    /// Human-readable text including the chain of underlying causes
    pub fn diagnostic(&self) -> String {
        let mut text = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            text.push_str("\n  caused by: ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Resolution { status: 401 | 403, .. } => {
                Some("Set forge.token in the config or export GITHUB_TOKEN")
            }
            Self::Resolution { status: 404, .. } => {
                Some("Check the organization, repository and ref names")
            }
            Self::CommandFailed { .. } => {
                Some("Check build.program in the config: showcase config show")
            }
            Self::BuildTimeout { .. } => Some("Raise cache.max_wait_secs or retry later"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_displays_message_verbatim() {
        let err = ShowcaseError::build("missing index file");
        assert_eq!(err.to_string(), "missing index file");
    }

    #[test]
    fn error_hint() {
        let err = ShowcaseError::Resolution {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(
            err.hint(),
            Some("Check the organization, repository and ref names")
        );
        assert_eq!(ShowcaseError::Internal("x".to_string()).hint(), None);
    }

    #[test]
    fn build_failures_identified() {
        assert!(ShowcaseError::build("boom").is_build_failure());
        assert!(ShowcaseError::BuildTimeout {
            key: "abc".to_string(),
            waited: std::time::Duration::from_secs(1),
        }
        .is_build_failure());
        assert!(!ShowcaseError::InvalidKeyInput("org".to_string()).is_build_failure());
    }

    #[test]
    fn diagnostic_includes_sources() {
        let err = ShowcaseError::io(
            "writing descriptor",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        );
        let text = err.diagnostic();
        assert!(text.starts_with("IO error: writing descriptor"));
        assert!(text.contains("caused by: read-only"));
    }

    #[test]
    fn into_build_keeps_build_errors() {
        let err = ShowcaseError::build("compile error").into_build();
        assert_eq!(err.to_string(), "compile error");

        let err = ShowcaseError::Internal("no output".to_string()).into_build();
        assert!(err.is_build_failure());
        assert_eq!(err.to_string(), "Internal error: no output");
    }
}
