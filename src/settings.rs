//! User settings and preferences
//!
//! Persisted separately from levels: LocalStorage on the web, a JSON file
//! natively. Missing keys take their defaults; corrupt data is discarded.

use serde::{Deserialize, Serialize};

use crate::consts::STARTING_LIVES;
use crate::input::KeyBindings;
use crate::sim::SessionOptions;

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Balls per game
    pub starting_lives: u32,
    /// Fixed launch-jitter seed; `None` picks a fresh one each session
    pub seed: Option<u64>,
    pub bindings: KeyBindings,
    /// `log` level name ("error" .. "trace")
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_lives: STARTING_LIVES,
            seed: None,
            bindings: KeyBindings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "pinball-settings";

    /// Parsed log level, falling back to Info on an unknown name
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Options for a new play session; `fresh_seed` is used unless a fixed
    /// seed is configured
    pub fn session_options(&self, fresh_seed: u64) -> SessionOptions {
        SessionOptions {
            seed: self.seed.unwrap_or(fresh_seed),
            // A zero-life game would end before the first tick
            starting_lives: self.starting_lives.max(1),
        }
    }

    /// Parse stored settings; corrupt data yields defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Settings are corrupt, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> bool {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let ok = storage.set_item(Self::STORAGE_KEY, &json).is_ok();
                log::info!("Settings saved");
                return ok;
            }
        }
        false
    }

    /// Load settings from a JSON file; a missing file means defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Loaded settings from {}", path.display());
                Self::from_json(&json)
            }
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> bool {
        let result = serde_json::to_string_pretty(self)
            .map_err(std::io::Error::from)
            .and_then(|json| std::fs::write(path, json));
        match result {
            Ok(()) => {
                log::info!("Settings saved");
                true
            }
            Err(e) => {
                log::warn!("Saving settings failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let settings = Settings::from_json(r#"{"seed": 9}"#);
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.starting_lives, 3);
        assert_eq!(settings.bindings, KeyBindings::default());
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        assert_eq!(Settings::from_json("{not json"), Settings::default());
    }

    #[test]
    fn test_session_options() {
        let mut settings = Settings::default();
        assert_eq!(settings.session_options(77).seed, 77);
        settings.seed = Some(5);
        settings.starting_lives = 0;
        let options = settings.session_options(77);
        assert_eq!(options.seed, 5);
        assert_eq!(options.starting_lives, 1);
    }

    #[test]
    fn test_log_level_filter() {
        let mut settings = Settings::default();
        settings.log_level = "debug".into();
        assert_eq!(settings.log_level_filter(), log::LevelFilter::Debug);
        settings.log_level = "loud".into();
        assert_eq!(settings.log_level_filter(), log::LevelFilter::Info);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());

        let mut settings = Settings::default();
        settings.starting_lives = 5;
        settings.bindings.launch = vec!["Enter".into()];
        assert!(settings.save_to(&path));
        assert_eq!(Settings::load_from(&path), settings);
    }
}
