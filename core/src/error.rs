//! Error types for the game core.

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    /// Difficulty name outside the fixed table
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    /// Note name outside `do..si`
    #[error("unknown note: {0}")]
    UnknownNote(String),

    /// Inscription submitted with a blank name
    #[error("player name must not be empty")]
    EmptyPlayerName,

    /// Configuration text could not be parsed
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Failures of the leaderboard persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed leaderboard data: {0}")]
    Parse(#[from] serde_json::Error),
}
