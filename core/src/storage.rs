//! Leaderboard persistence.
//!
//! The leaderboard is stored as one JSON blob, the same array-of-entries
//! layout the browser keeps in local storage.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::score::ScoreEntry;

pub trait LeaderboardStore {
    /// Returns the stored entries, or an empty list if nothing is stored yet.
    fn load(&self) -> Result<Vec<ScoreEntry>, StorageError>;

    fn save(&mut self, entries: &[ScoreEntry]) -> Result<(), StorageError>;
}

/// In-memory blob, seeded from and read back by the host.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank blobs are treated as "nothing stored".
    pub fn from_blob(blob: impl Into<String>) -> Self {
        let blob = blob.into();
        Self {
            blob: (!blob.trim().is_empty()).then_some(blob),
        }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl LeaderboardStore for MemoryStore {
    fn load(&self) -> Result<Vec<ScoreEntry>, StorageError> {
        match &self.blob {
            Some(blob) => Ok(serde_json::from_str(blob)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, entries: &[ScoreEntry]) -> Result<(), StorageError> {
        self.blob = Some(serde_json::to_string(entries)?);
        Ok(())
    }
}

/// Leaderboard kept in a JSON file, for native hosts.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeaderboardStore for JsonFileStore {
    fn load(&self) -> Result<Vec<ScoreEntry>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&mut self, entries: &[ScoreEntry]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}
