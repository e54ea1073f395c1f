//! Configuration loading and hot-reload.
//!
//! # Hierarchy
//!
//! 1. Built-in defaults
//! 2. Global config: `~/.config/matrix/config.toml`
//! 3. Environment variables: `MATRIX_*`
//!
//! Later layers override earlier ones; merging is explicit-key (a partial
//! config file that only sets one field never resets the others).
//!
//! # Hot-reload
//!
//! Long-running processes (the scheduler daemon, the hook dispatcher's
//! persistent mode) should hold a [`ConfigManager`] rather than a bare
//! [`Config`]: it watches the global config file via `notify` and swaps in
//! the reloaded config on change, falling back to the last-known-good config
//! if a reload fails to parse.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};

use crate::error::Error;

/// Fully-resolved configuration knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Override for the store's on-disk path; `None` uses [`crate::paths::Layout::discover`].
    pub store_path: Option<PathBuf>,
    /// Embedding dimension. Only meaningful as a test-only override; production
    /// code must use [`crate::embedding::DIMENSION`].
    pub embedding_dimension: usize,
    pub recall_default_limit: i64,
    pub recall_min_score: f32,
    pub indexer_max_file_bytes: u64,
    pub indexer_include_tests: bool,
    pub scheduler_default_timeout_secs: i64,
    pub http_cache_ttl_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            embedding_dimension: crate::embedding::DIMENSION,
            recall_default_limit: 10,
            recall_min_score: 0.0,
            indexer_max_file_bytes: 1_000_000,
            indexer_include_tests: false,
            scheduler_default_timeout_secs: crate::domain::task::DEFAULT_TIMEOUT_SECS,
            http_cache_ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Explicit-key partial config, as read from a TOML file. `None` means
/// "not set here", not "set to the zero value".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialConfig {
    pub store_path: Option<PathBuf>,
    pub embedding_dimension: Option<usize>,
    pub recall_default_limit: Option<i64>,
    pub recall_min_score: Option<f32>,
    pub indexer_max_file_bytes: Option<u64>,
    pub indexer_include_tests: Option<bool>,
    pub scheduler_default_timeout_secs: Option<i64>,
    pub http_cache_ttl_secs: Option<i64>,
}

impl Config {
    /// Merge a partial config into this one using explicit-key semantics:
    /// only `Some` fields override.
    pub fn merge_partial(&mut self, partial: PartialConfig) {
        if let Some(v) = partial.store_path {
            self.store_path = Some(v);
        }
        if let Some(v) = partial.embedding_dimension {
            self.embedding_dimension = v;
        }
        if let Some(v) = partial.recall_default_limit {
            self.recall_default_limit = v;
        }
        if let Some(v) = partial.recall_min_score {
            self.recall_min_score = v;
        }
        if let Some(v) = partial.indexer_max_file_bytes {
            self.indexer_max_file_bytes = v;
        }
        if let Some(v) = partial.indexer_include_tests {
            self.indexer_include_tests = v;
        }
        if let Some(v) = partial.scheduler_default_timeout_secs {
            self.scheduler_default_timeout_secs = v;
        }
        if let Some(v) = partial.http_cache_ttl_secs {
            self.http_cache_ttl_secs = v;
        }
    }

    /// Validate hard invariants that TOML parsing can't express.
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.recall_min_score) {
            return Err(Error::validation(
                "recall_min_score",
                "must be within [0.0, 1.0]",
            ));
        }
        if self.scheduler_default_timeout_secs <= 0 {
            return Err(Error::validation(
                "scheduler_default_timeout_secs",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Apply `MATRIX_*` environment variable overrides.
    pub fn apply_env_vars(mut self) -> crate::Result<Self> {
        if let Ok(v) = std::env::var("MATRIX_STORE_PATH") {
            self.store_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("MATRIX_RECALL_DEFAULT_LIMIT") {
            self.recall_default_limit = v
                .parse()
                .map_err(|_| Error::validation("MATRIX_RECALL_DEFAULT_LIMIT", "not an integer"))?;
        }
        if let Ok(v) = std::env::var("MATRIX_RECALL_MIN_SCORE") {
            self.recall_min_score = v
                .parse()
                .map_err(|_| Error::validation("MATRIX_RECALL_MIN_SCORE", "not a float"))?;
        }
        if let Ok(v) = std::env::var("MATRIX_INDEXER_INCLUDE_TESTS") {
            self.indexer_include_tests = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("MATRIX_SCHEDULER_DEFAULT_TIMEOUT_SECS") {
            self.scheduler_default_timeout_secs = v.parse().map_err(|_| {
                Error::validation("MATRIX_SCHEDULER_DEFAULT_TIMEOUT_SECS", "not an integer")
            })?;
        }
        Ok(self)
    }
}

/// Path to the global config file (`~/.config/matrix/config.toml` on Linux).
#[must_use]
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "matrix")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load a partial config from a TOML file.
pub fn load_toml_file(path: &std::path::Path) -> crate::Result<PartialConfig> {
    if path.is_dir() {
        return Err(Error::validation(
            "config path",
            format!("{} is a directory, not a file", path.display()),
        ));
    }
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::validation("config file", format!("{}: {e}", path.display())))
}

/// Load configuration from every layer: defaults, global file, env vars.
pub fn load_config() -> crate::Result<Config> {
    let mut config = Config::default();

    if let Some(path) = global_config_path() {
        if path.exists() {
            config.merge_partial(load_toml_file(&path)?);
        }
    }

    let config = config.apply_env_vars()?;
    config.validate()?;
    Ok(config)
}

/// Thread-safe configuration handle that reloads from the global config file
/// on write, falling back to the previous config if the reload is invalid.
#[derive(Clone)]
pub struct ConfigManager {
    inner: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// Load the initial config and start watching the global config file for
    /// changes. Watch failures are non-fatal: the manager simply never
    /// reloads and keeps serving the initial config.
    pub async fn new() -> crate::Result<Self> {
        let config = load_config()?;
        let manager = Self {
            inner: Arc::new(RwLock::new(config)),
        };

        let inner = manager.inner.clone();
        let mut rx = Self::watch_global_config();
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(Duration::from_millis(150)).await;
                match load_config() {
                    Ok(reloaded) => {
                        *inner.write().await = reloaded;
                        tracing::info!("config reloaded");
                    }
                    Err(err) => {
                        tracing::warn!("config reload failed, keeping previous config: {err}");
                    }
                }
            }
        });

        Ok(manager)
    }

    /// Fast, non-blocking read of the current configuration.
    pub async fn get(&self) -> Config {
        self.inner.read().await.clone()
    }

    fn watch_global_config() -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel::<()>(4);
        let Some(path) = global_config_path() else {
            return rx;
        };

        tokio::spawn(async move {
            use notify::Watcher as _;

            let Ok(mut watcher) = notify::recommended_watcher(
                move |res: std::result::Result<notify::Event, notify::Error>| {
                    if let Ok(event) = res {
                        if event.kind.is_modify() || event.kind.is_create() {
                            let _ = tx.blocking_send(());
                        }
                    }
                },
            ) else {
                return;
            };

            let watch_target = if path.exists() {
                path.clone()
            } else if let Some(parent) = path.parent() {
                parent.to_path_buf()
            } else {
                return;
            };
            if watcher
                .watch(&watch_target, notify::RecursiveMode::NonRecursive)
                .is_err()
            {
                return;
            }

            tokio::time::sleep(Duration::from_secs(u64::MAX)).await;
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn merge_partial_only_overrides_present_fields() {
        let mut config = Config::default();
        let default_timeout = config.scheduler_default_timeout_secs;
        config.merge_partial(PartialConfig {
            recall_default_limit: Some(25),
            ..Default::default()
        });
        assert_eq!(config.recall_default_limit, 25);
        assert_eq!(config.scheduler_default_timeout_secs, default_timeout);
    }

    #[test]
    fn validate_rejects_out_of_range_min_score() {
        let mut config = Config::default();
        config.recall_min_score = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_timeout() {
        let mut config = Config::default();
        config.scheduler_default_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
