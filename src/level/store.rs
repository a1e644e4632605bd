//! Level files on disk
//!
//! A level directory holds one JSON file per table plus an `index.json`
//! manifest listing the filenames in display order.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{Level, LevelError};

/// Name of the manifest inside a level directory
pub const INDEX_FILE: &str = "index.json";

/// Errors from reading or writing level files
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("level I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("level index is malformed: {0}")]
    Index(#[from] serde_json::Error),
    #[error("filename `{0}` must end with .json")]
    InvalidFilename(String),
}

/// One entry of the level listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEntry {
    pub filename: String,
    /// Display name (filename without extension)
    pub name: String,
}

impl LevelEntry {
    pub fn from_filename(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let name = filename
            .strip_suffix(".json")
            .unwrap_or(&filename)
            .to_string();
        Self { filename, name }
    }
}

/// Where levels come from and go to
pub trait LevelStore {
    /// Ordered listing; unreadable listings come back empty
    fn list(&self) -> Vec<LevelEntry>;
    /// Load and validate one level
    fn load(&self, entry: &LevelEntry) -> Result<Level, StoreError>;
    /// Write a level under `filename`; last writer wins
    fn save(&self, level: &Level, filename: &str) -> bool;
}

/// Level store backed by a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct DirLevelStore {
    root: PathBuf,
}

impl DirLevelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_index(&self) -> Result<Vec<String>, StoreError> {
        let json = fs::read_to_string(self.root.join(INDEX_FILE))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn try_save(&self, level: &Level, filename: &str) -> Result<(), StoreError> {
        if !filename.ends_with(".json") || filename.contains(['/', '\\']) {
            return Err(StoreError::InvalidFilename(filename.to_string()));
        }
        let json = level.to_json_pretty()?;
        fs::create_dir_all(&self.root)?;
        fs::write(self.root.join(filename), json)?;

        // A missing or corrupt index is rebuilt from scratch
        let mut index = self.read_index().unwrap_or_default();
        if !index.iter().any(|f| f == filename) {
            index.push(filename.to_string());
            fs::write(
                self.root.join(INDEX_FILE),
                serde_json::to_string_pretty(&index)?,
            )?;
        }
        Ok(())
    }
}

impl LevelStore for DirLevelStore {
    fn list(&self) -> Vec<LevelEntry> {
        match self.read_index() {
            Ok(files) => files.into_iter().map(LevelEntry::from_filename).collect(),
            Err(e) => {
                log::warn!("Could not read level index in {}: {}", self.root.display(), e);
                Vec::new()
            }
        }
    }

    fn load(&self, entry: &LevelEntry) -> Result<Level, StoreError> {
        let json = fs::read_to_string(self.root.join(&entry.filename))?;
        let mut level = Level::from_json(&json)?;
        if level.name.trim().is_empty() {
            level.name = entry.name.clone();
        }
        log::info!("Loaded level '{}' from {}", level.name, entry.filename);
        Ok(level)
    }

    fn save(&self, level: &Level, filename: &str) -> bool {
        match self.try_save(level, filename) {
            Ok(()) => {
                log::info!("Saved level '{}' to {}", level.name, filename);
                true
            }
            Err(e) => {
                log::warn!("Saving level '{}' failed: {}", level.name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_strips_extension() {
        let entry = LevelEntry::from_filename("classic.json");
        assert_eq!(entry.name, "classic");
        assert_eq!(LevelEntry::from_filename("odd").name, "odd");
    }

    #[test]
    fn test_missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirLevelStore::new(dir.path().join("nope"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_save_then_list_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirLevelStore::new(dir.path());
        let level = Level::classic();

        assert!(store.save(&level, "classic.json"));
        assert!(store.save(&level, "classic.json"));
        let mut other = Level::empty("Other");
        other.name.clear();
        assert!(store.save(&other, "other.json"));

        let entries = store.list();
        assert_eq!(
            entries.iter().map(|e| e.filename.as_str()).collect::<Vec<_>>(),
            vec!["classic.json", "other.json"]
        );

        let loaded = store.load(&entries[0]).unwrap();
        assert_eq!(loaded, level);
        // Unnamed levels take the display name of their file
        let loaded = store.load(&entries[1]).unwrap();
        assert_eq!(loaded.name, "other");
    }

    #[test]
    fn test_save_rejects_bad_filename() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirLevelStore::new(dir.path());
        assert!(!store.save(&Level::classic(), "classic.txt"));
        assert!(!store.save(&Level::classic(), "../escape.json"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_load_reports_malformed_level() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{ \"name\": 3 }").unwrap();
        let store = DirLevelStore::new(dir.path());
        let err = store.load(&LevelEntry::from_filename("bad.json")).unwrap_err();
        assert!(matches!(err, StoreError::Level(LevelError::Parse(_))));
    }
}
