//! Game core for Musical Spells, a note-sequence memory duel.
//!
//! The player listens to an enemy's spell (a random run of solfège notes) and
//! plays it back. Correct spells hurt the enemy, wrong ones hurt the player.
//! The [`Game`] owns the campaign, drives each encounter through the
//! [`battle`] state machine and keeps score; hosts feed it input and elapsed
//! time and render the [`Event`]s it queues.

pub mod battle;
pub mod config;
pub mod enemies;
pub mod error;
pub mod event;
pub mod input;
mod log;
pub mod model;
pub mod rng;
pub mod run;
pub mod score;
pub mod sequence;
pub mod step_api;
pub mod storage;
pub mod timer;

pub use config::GameConfig;
pub use error::{GameError, Result};
pub use event::Event;
pub use model::{Difficulty, Note, Outcome, Screen};
pub use run::Game;
pub use score::{ScoreEngine, ScoreEntry};
pub use storage::{JsonFileStore, LeaderboardStore, MemoryStore};
