//! Saved levels library
//!
//! Name-keyed collection of levels saved from the editor. Persisted to
//! LocalStorage on the web and to a JSON file natively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Level;

/// A level saved from the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLevel {
    pub name: String,
    /// When saved; an ISO-8601 string in storage
    pub saved_at: DateTime<Utc>,
    pub config: Level,
}

/// Saved levels, in first-save order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedLevels {
    pub entries: Vec<SavedLevel>,
}

impl SavedLevels {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "pinball-saved-levels";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Store a copy of `level`, replacing any entry with the same name
    pub fn save_level(&mut self, level: &Level, saved_at: DateTime<Utc>) -> &SavedLevel {
        let entry = SavedLevel {
            name: level.name.clone(),
            saved_at,
            config: level.clone(),
        };
        let idx = match self.entries.iter().position(|e| e.name == level.name) {
            Some(i) => {
                self.entries[i] = entry;
                i
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        &self.entries[idx]
    }

    /// Remove the entry called `name` (no-op if absent)
    pub fn delete(&mut self, name: &str) {
        self.entries.retain(|e| e.name != name);
    }

    pub fn get(&self, name: &str) -> Option<&SavedLevel> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Parse a stored library; corrupt data yields an empty library
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<SavedLevels>(json) {
            Ok(levels) => levels,
            Err(e) => {
                log::warn!("Saved levels are corrupt, starting fresh: {}", e);
                Self::new()
            }
        }
    }

    /// Load saved levels from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                let levels = Self::from_json(&json);
                log::info!("Loaded {} saved levels", levels.entries.len());
                return levels;
            }
        }

        log::info!("No saved levels found, starting fresh");
        Self::new()
    }

    /// Save to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> bool {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let ok = storage.set_item(Self::STORAGE_KEY, &json).is_ok();
                log::info!("Saved levels stored ({} entries)", self.entries.len());
                return ok;
            }
        }
        false
    }

    /// Load saved levels from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let levels = Self::from_json(&json);
                log::info!("Loaded {} saved levels", levels.entries.len());
                levels
            }
            Err(_) => {
                log::info!("No saved levels found, starting fresh");
                Self::new()
            }
        }
    }

    /// Write saved levels to a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> bool {
        let result = serde_json::to_string(self)
            .map_err(std::io::Error::from)
            .and_then(|json| std::fs::write(path, json));
        match result {
            Ok(()) => {
                log::info!("Saved levels stored ({} entries)", self.entries.len());
                true
            }
            Err(e) => {
                log::warn!("Storing saved levels failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_save_overwrites_by_name() {
        let mut lib = SavedLevels::new();
        let mut level = Level::classic();
        lib.save_level(&level, at(1));
        level.ball_spawn.x = 123.0;
        let entry = lib.save_level(&level, at(2));
        assert_eq!(entry.saved_at, at(2));
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.get("Classic").unwrap().config.ball_spawn.x, 123.0);

        lib.save_level(&Level::empty("Second"), at(3));
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.entries[1].name, "Second");
    }

    #[test]
    fn test_saved_copy_does_not_alias() {
        let mut lib = SavedLevels::new();
        let mut level = Level::classic();
        lib.save_level(&level, at(1));
        level.walls.clear();
        assert!(!lib.get("Classic").unwrap().config.walls.is_empty());
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut lib = SavedLevels::new();
        lib.save_level(&Level::empty("A"), Utc::now());
        lib.delete("B");
        assert_eq!(lib.len(), 1);
        lib.delete("A");
        assert!(lib.is_empty());
    }

    #[test]
    fn test_corrupt_json_loads_empty() {
        assert!(SavedLevels::from_json("not json").is_empty());
    }

    #[test]
    fn test_reads_iso_timestamps() {
        let config = Level::empty("Browser").to_json_pretty().unwrap();
        let json = format!(
            r#"[{{"name":"Browser","savedAt":"2024-05-01T12:30:00.000Z","config":{config}}}]"#
        );
        let lib = SavedLevels::from_json(&json);
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.entries[0].saved_at, at(1_714_566_600));

        let back = serde_json::to_string(&lib).unwrap();
        assert!(back.contains(r#""savedAt":"2024-05-01T12:30:00Z""#));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let mut lib = SavedLevels::new();
        lib.save_level(&Level::classic(), at(42));
        assert!(lib.save_to(&path));
        assert_eq!(SavedLevels::load_from(&path), lib);
        assert!(SavedLevels::load_from(&dir.path().join("missing.json")).is_empty());
    }
}
