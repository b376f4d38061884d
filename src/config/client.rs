//! Client configuration loaded from TOML files
//!
//! Every section is optional; missing keys fall back to defaults.
//!
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:8000"
//! timeout_secs = 60
//!
//! [storage]
//! backend = "sqlite"
//! data_dir = "./data"
//!
//! [history]
//! max_conversations = 8
//!
//! [display]
//! reveal_delay_ms = 15
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ConfigError;
use crate::render::{FALLBACK_REVEAL_DELAY_MS, REVEAL_DELAY_MS};

/// Root client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Lookup backend settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Where history lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// History retention
    #[serde(default)]
    pub history: HistoryConfig,

    /// Terminal rendering
    #[serde(default)]
    pub display: DisplayConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the lookup service, without trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for a single lookup or explanation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    File,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "file" | "json" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Validation(format!(
                "Unknown storage backend: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Key holding the conversation list. Change it to change the format.
    #[serde(default = "default_history_key")]
    pub history_key: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_history_key() -> String {
    "neuralflow_history".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            history_key: default_history_key(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Keep at most this many conversations; absent or 0 keeps all
    #[serde(default)]
    pub max_conversations: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Per-character delay when revealing an explanation
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,

    /// Per-character delay when revealing the offline fallback
    #[serde(default = "default_fallback_reveal_delay_ms")]
    pub fallback_reveal_delay_ms: u64,
}

fn default_reveal_delay_ms() -> u64 {
    REVEAL_DELAY_MS
}

fn default_fallback_reveal_delay_ms() -> u64 {
    FALLBACK_REVEAL_DELAY_MS
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            reveal_delay_ms: default_reveal_delay_ms(),
            fallback_reveal_delay_ms: default_fallback_reveal_delay_ms(),
        }
    }
}
