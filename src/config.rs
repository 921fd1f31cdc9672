//! Filer configuration, loaded from YAML.
//!
//! ```yaml
//! directory_cache:
//!   enabled: true
//!   max_entries: 1000
//! reclaim:
//!   mode: background
//!   lookup_timeout_ms: 2000
//! store:
//!   kind: localfs
//!   root: /var/lib/slayer-filer/meta
//! masters: ["127.0.0.1:9333"]
//! volumes:
//!   - { vid: 3, url: "127.0.0.1:8080" }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilerConfig {
    pub directory_cache: CacheConfig,
    pub reclaim: ReclaimConfig,
    pub store: StoreConfig,
    /// Cluster coordinator addresses, tried in order.
    pub masters: Vec<String>,
    pub reconnect_interval_ms: u64,
    /// Page size used when walking children during recursive delete.
    pub list_page_size: usize,
    /// Static volume locations served when no master is reachable.
    pub volumes: Vec<VolumeConfig>,
}

impl Default for FilerConfig {
    fn default() -> Self {
        Self {
            directory_cache: CacheConfig::default(),
            reclaim: ReclaimConfig::default(),
            store: StoreConfig::default(),
            masters: Vec::new(),
            reconnect_interval_ms: 1000,
            list_page_size: 1024,
            volumes: Vec::new(),
        }
    }
}

impl FilerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.list_page_size == 0 {
            return Err(ConfigError::Invalid("list_page_size must be > 0".into()));
        }
        if self.directory_cache.enabled && self.directory_cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "directory_cache.max_entries must be > 0 when the cache is enabled".into(),
            ));
        }
        if self.store.kind == StoreKind::LocalFs && self.store.root.is_none() {
            return Err(ConfigError::Invalid(
                "store.root is required for the localfs store".into(),
            ));
        }
        Ok(())
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Upper bound on cached directories; least recently used go first.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReclaimMode {
    /// The write waits for reclamation to finish.
    #[default]
    Inline,
    /// Reclamation is spawned after the write is persisted.
    Background,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReclaimConfig {
    pub mode: ReclaimMode,
    pub lookup_timeout_ms: u64,
    pub delete_timeout_ms: u64,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            mode: ReclaimMode::Inline,
            lookup_timeout_ms: 5000,
            delete_timeout_ms: 5000,
        }
    }
}

impl ReclaimConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn delete_timeout(&self) -> Duration {
        Duration::from_millis(self.delete_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    LocalFs,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeConfig {
    pub vid: u32,
    pub url: String,
    #[serde(default)]
    pub public_url: Option<String>,
}
