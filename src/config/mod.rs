//! Application configuration

pub mod client;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::render::{FALLBACK_REVEAL_DELAY_MS, REVEAL_DELAY_MS};

pub use client::{ClientConfig, StorageBackend};

/// Resolved settings: TOML file first, environment on top
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub storage: StorageBackend,
    pub data_dir: PathBuf,
    pub history_key: String,
    pub max_conversations: Option<usize>,
    pub reveal_delay: Duration,
    pub fallback_reveal_delay: Duration,
}

impl Config {
    /// Read `NEURALFLOW_CONFIG` (or `./neuralflow.toml` when present), then
    /// apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match env::var("NEURALFLOW_CONFIG") {
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => Some(PathBuf::from("neuralflow.toml")).filter(|p| p.exists()),
        };

        let client = match file {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                ClientConfig::from_file(&path)?
            }
            None => ClientConfig::default(),
        };

        Self::from_client(client)?.with_env_overrides(|name| env::var(name).ok())
    }

    pub fn from_client(client: ClientConfig) -> Result<Self, ConfigError> {
        if client.api.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("api.base_url is empty".into()));
        }

        Ok(Self {
            api_url: client.api.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(client.api.timeout_secs),
            storage: client.storage.backend,
            data_dir: client.storage.data_dir,
            history_key: client.storage.history_key,
            max_conversations: client.history.max_conversations.filter(|n| *n > 0),
            reveal_delay: Duration::from_millis(client.display.reveal_delay_ms),
            fallback_reveal_delay: Duration::from_millis(client.display.fallback_reveal_delay_ms),
        })
    }

    fn with_env_overrides(
        mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = var("NEURALFLOW_API_URL") {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = var("NEURALFLOW_TIMEOUT_SECS") {
            let secs = secs.parse().map_err(|_| {
                ConfigError::Validation(format!("NEURALFLOW_TIMEOUT_SECS: {}", secs))
            })?;
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(backend) = var("NEURALFLOW_STORAGE") {
            self.storage = backend.parse()?;
        }
        if let Some(dir) = var("NEURALFLOW_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(limit) = var("NEURALFLOW_HISTORY_LIMIT") {
            let limit: usize = limit.parse().map_err(|_| {
                ConfigError::Validation(format!("NEURALFLOW_HISTORY_LIMIT: {}", limit))
            })?;
            self.max_conversations = Some(limit).filter(|n| *n > 0);
        }
        Ok(self)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            request_timeout: Duration::from_secs(60),
            storage: StorageBackend::default(),
            data_dir: PathBuf::from("./data"),
            history_key: "neuralflow_history".to_string(),
            max_conversations: None,
            reveal_delay: Duration::from_millis(REVEAL_DELAY_MS),
            fallback_reveal_delay: Duration::from_millis(FALLBACK_REVEAL_DELAY_MS),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
