//! Configuration management for Showcase

pub mod schema;

pub use schema::Config;

use crate::error::{ShowcaseError, ShowcaseResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("showcase")
            .join("config.toml")
    }

    /// Load configuration for running commands
    ///
    /// A relative `cache.root` is taken relative to the config file's
    /// directory, so a config and its cache can move together.
    pub async fn load(&self) -> ShowcaseResult<Config> {
        let mut config = self.load_raw().await?;
        self.anchor_paths(&mut config);
        Ok(config)
    }

    /// Load the file as written, or defaults if it does not exist
    pub async fn load_raw(&self) -> ShowcaseResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            ShowcaseError::io(
                format!("reading config from {}", self.config_path.display()),
                e,
            )
        })?;

        toml::from_str(&content).map_err(|e| ShowcaseError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }

    fn anchor_paths(&self, config: &mut Config) {
        let Some(dir) = self.config_path.parent() else {
            return;
        };
        if let Some(root) = config.cache.root.as_mut() {
            if root.is_relative() {
                *root = dir.join(&*root);
                debug!("Cache root anchored at {}", root.display());
            }
        }
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ShowcaseResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShowcaseError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ShowcaseResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShowcaseError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.build.program = "stylus-build".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.build.program, "stylus-build");
    }

    #[tokio::test]
    async fn relative_cache_root_follows_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[cache]\nroot = \"built\"\n")
            .await
            .unwrap();
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.cache.root_dir(), temp.path().join("built"));

        let raw = manager.load_raw().await.unwrap();
        assert_eq!(raw.cache.root, Some(PathBuf::from("built")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn absolute_cache_root_unchanged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[cache]\nroot = \"/srv/showcase\"\n")
            .await
            .unwrap();

        let config = ConfigManager::with_path(path).load().await.unwrap();
        assert_eq!(config.cache.root_dir(), PathBuf::from("/srv/showcase"));
    }

    #[tokio::test]
    async fn invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[server]\nport = \"nope\"\n")
            .await
            .unwrap();

        let err = ConfigManager::with_path(path.clone())
            .load()
            .await
            .unwrap_err();
        match err {
            ShowcaseError::ConfigInvalid { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }
}
