//! Runtime-tunable settings and their admin API

mod handler;
mod store;

pub use handler::{settings_router, SettingsState};
pub use store::{RuntimeSettings, SettingsPatch, SettingsStore};
