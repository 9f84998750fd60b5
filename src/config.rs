//! MemeVault configuration management
//!
//! Startup configuration loaded from TOML. Values that operators tune at
//! runtime through the admin API (cooldown, reply probability, menu cap)
//! live in [`crate::settings`] instead and are persisted separately.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main MemeVault configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemeVaultConfig {
    /// Admin HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ingestion pipeline configuration
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// External classifier configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Admin HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = allow any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18920,
            cors_origins: Vec::new(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for the index, settings, and media files
    pub base_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

/// Default base directory (~/.memevault)
pub fn default_base_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memevault")
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Timeout for downloading a candidate media item, in seconds
    pub fetch_timeout_secs: u64,

    /// Timeout for a single classifier round-trip, in seconds
    pub classify_timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            classify_timeout_secs: 30,
        }
    }
}

impl IngestionConfig {
    /// Fetch timeout as a `Duration`
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Classify timeout as a `Duration`
    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }
}

/// External classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Chat-completions style endpoint of the vision model
    pub endpoint: String,

    /// API key sent as a bearer token (optional for local backends)
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434/v1/chat/completions".to_string(),
            api_key: None,
            model: "llava".to_string(),
        }
    }
}
