use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// One of the seven solfège notes a spell is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Note {
    Do,
    Re,
    Mi,
    Fa,
    Sol,
    La,
    Si,
}

impl Note {
    pub const ALL: [Note; 7] = [
        Note::Do,
        Note::Re,
        Note::Mi,
        Note::Fa,
        Note::Sol,
        Note::La,
        Note::Si,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Note::Do => "do",
            Note::Re => "re",
            Note::Mi => "mi",
            Note::Fa => "fa",
            Note::Sol => "sol",
            Note::La => "la",
            Note::Si => "si",
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Note {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::ALL
            .iter()
            .copied()
            .find(|note| note.as_str() == s)
            .ok_or_else(|| GameError::UnknownNote(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Novice,
    Apprentice,
    Adept,
    Master,
}

/// Note pool and base spell length of a difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DifficultyProfile {
    pub notes: &'static [Note],
    pub base_sequence_length: usize,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Novice => "novice",
            Difficulty::Apprentice => "apprentice",
            Difficulty::Adept => "adept",
            Difficulty::Master => "master",
        }
    }

    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Novice => DifficultyProfile {
                notes: &[Note::Do, Note::Re],
                base_sequence_length: 2,
            },
            Difficulty::Apprentice => DifficultyProfile {
                notes: &[Note::Do, Note::Re, Note::Mi],
                base_sequence_length: 2,
            },
            Difficulty::Adept => DifficultyProfile {
                notes: &[Note::Do, Note::Re, Note::Mi, Note::Fa, Note::Sol],
                base_sequence_length: 3,
            },
            Difficulty::Master => DifficultyProfile {
                notes: &[
                    Note::Do,
                    Note::Re,
                    Note::Mi,
                    Note::Fa,
                    Note::Sol,
                    Note::La,
                    Note::Si,
                ],
                base_sequence_length: 3,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "novice" => Ok(Difficulty::Novice),
            "apprentice" => Ok(Difficulty::Apprentice),
            "adept" => Ok(Difficulty::Adept),
            "master" => Ok(Difficulty::Master),
            _ => Err(GameError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Static opponent record. The display name is looked up by the host under
/// `enemies.{id}.name`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Enemy {
    pub id: &'static str,
    pub base_health: i32,
    pub difficulty_tier: u32,
    pub glyph: &'static str,
}

/// Campaign state, owned by the run controller for the lifetime of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunState {
    /// Highest unlocked roster index.
    pub current_level_index: usize,
    pub difficulty: Difficulty,
    pub available_notes: Vec<Note>,
    pub play_reference_note: bool,
    pub defeated_enemy_indices: BTreeSet<usize>,
    /// Carried from one encounter to the next.
    pub player_health: i32,
    pub player_max_health: i32,
}

impl RunState {
    pub fn new(difficulty: Difficulty, play_reference_note: bool, player_max_health: i32) -> Self {
        Self {
            current_level_index: 0,
            difficulty,
            available_notes: difficulty.profile().notes.to_vec(),
            play_reference_note,
            defeated_enemy_indices: BTreeSet::new(),
            player_health: player_max_health,
            player_max_health,
        }
    }

    pub fn is_unlocked(&self, enemy_index: usize) -> bool {
        enemy_index <= self.current_level_index
    }
}

/// Per-encounter state. Replaced wholesale whenever an enemy is selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncounterState {
    pub enemy_index: usize,
    pub enemy: Enemy,
    pub player_health: i32,
    pub player_max_health: i32,
    pub enemy_health: i32,
    pub enemy_max_health: i32,
    pub spell_sequence: Vec<Note>,
    pub player_sequence: Vec<Note>,
    pub is_player_turn: bool,
    /// Fail latch: set on the first wrong note, cleared when the next round starts.
    pub has_failed: bool,
}

impl EncounterState {
    pub fn new(enemy_index: usize, enemy: Enemy, player_health: i32, player_max_health: i32) -> Self {
        Self {
            enemy_index,
            enemy,
            player_health,
            player_max_health,
            enemy_health: enemy.base_health,
            enemy_max_health: enemy.base_health,
            spell_sequence: Vec::new(),
            player_sequence: Vec::new(),
            is_player_turn: false,
            has_failed: false,
        }
    }

    pub fn accepts_input(&self) -> bool {
        self.is_player_turn && !self.has_failed
    }
}

/// Result of feeding one note into the player's sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Correct so far, more notes expected (also returned when an overflow note is dropped).
    Pending,
    Success,
    Fail,
    /// Input arrived outside the player turn or after the fail latch.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Start,
    Map,
    Battle,
    Result,
    Inscription,
}

impl Screen {
    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Start => "start",
            Screen::Map => "map",
            Screen::Battle => "battle",
            Screen::Result => "result",
            Screen::Inscription => "inscription",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_table_matches_note_pools() {
        let sizes: Vec<(usize, usize)> = [
            Difficulty::Novice,
            Difficulty::Apprentice,
            Difficulty::Adept,
            Difficulty::Master,
        ]
        .iter()
        .map(|d| (d.profile().notes.len(), d.profile().base_sequence_length))
        .collect();

        assert_eq!(sizes, vec![(2, 2), (3, 2), (5, 3), (7, 3)]);
        assert_eq!(Difficulty::Novice.profile().notes, &[Note::Do, Note::Re]);
    }

    #[test]
    fn names_parse_back() {
        assert_eq!("sol".parse::<Note>().unwrap(), Note::Sol);
        assert_eq!("adept".parse::<Difficulty>().unwrap(), Difficulty::Adept);
        assert!(matches!("ut".parse::<Note>(), Err(GameError::UnknownNote(_))));
        assert!(matches!(
            "legend".parse::<Difficulty>(),
            Err(GameError::UnknownDifficulty(_))
        ));
    }

    #[test]
    fn run_state_starts_at_level_zero_with_difficulty_notes() {
        let run = RunState::new(Difficulty::Apprentice, true, 100);
        assert_eq!(run.current_level_index, 0);
        assert_eq!(run.available_notes, vec![Note::Do, Note::Re, Note::Mi]);
        assert!(run.is_unlocked(0));
        assert!(!run.is_unlocked(1));
    }
}
