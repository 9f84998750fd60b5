//! Runtime-tunable settings with JSON persistence
//!
//! These are the knobs operators adjust while the service runs:
//! cooldown between classifier calls, the probability of offering the
//! meme menu on a reply, and the menu sample cap. They live in
//! `settings.json` next to the index and survive restarts; the startup
//! TOML config never overrides them.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::RwLock;

/// Runtime-mutable settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Minimum seconds between classifier invocations
    pub cooldown_seconds: u64,

    /// Percent chance (0-100) that a reply gets the meme menu hint
    pub reply_probability: u8,

    /// Maximum number of tag descriptions offered in one menu
    pub menu_sample_cap: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            cooldown_seconds: 30,
            reply_probability: 100,
            menu_sample_cap: 40,
        }
    }
}

impl RuntimeSettings {
    /// Cooldown as a `Duration`
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    fn normalized(mut self) -> Self {
        self.reply_probability = self.reply_probability.min(100);
        self
    }
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub cooldown_seconds: Option<u64>,
    pub reply_probability: Option<u8>,
    pub menu_sample_cap: Option<usize>,
}

/// Settings store backed by a single JSON file
pub struct SettingsStore {
    path: PathBuf,
    settings: RwLock<RuntimeSettings>,
}

impl SettingsStore {
    /// Open the settings file under the given base directory
    ///
    /// A missing or malformed file loads the defaults.
    pub async fn new(base_dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&base_dir).await?;
        let path = base_dir.join("settings.json");

        let settings = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<RuntimeSettings>(&raw) {
                Ok(parsed) => parsed.normalized(),
                Err(e) => {
                    tracing::warn!("Malformed settings {}, using defaults: {}", path.display(), e);
                    RuntimeSettings::default()
                }
            },
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read settings {}: {}", path.display(), e);
                }
                RuntimeSettings::default()
            }
        };

        Ok(Self {
            path,
            settings: RwLock::new(settings),
        })
    }

    /// Current settings snapshot
    pub async fn get(&self) -> RuntimeSettings {
        *self.settings.read().await
    }

    /// Apply a partial update and persist
    ///
    /// On a persistence failure the previous settings stay in effect.
    pub async fn update(&self, patch: SettingsPatch) -> Result<RuntimeSettings> {
        let mut settings = self.settings.write().await;
        let previous = *settings;

        let mut updated = previous;
        if let Some(cooldown) = patch.cooldown_seconds {
            updated.cooldown_seconds = cooldown;
        }
        if let Some(probability) = patch.reply_probability {
            updated.reply_probability = probability;
        }
        if let Some(cap) = patch.menu_sample_cap {
            updated.menu_sample_cap = cap;
        }
        let updated = updated.normalized();
        *settings = updated;

        if let Err(e) = self.flush(&updated).await {
            *settings = previous;
            return Err(e);
        }
        Ok(updated)
    }

    /// Write the settings file atomically (temp file, then rename)
    async fn flush(&self, settings: &RuntimeSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}
