use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Difficulty, RunState};
use crate::storage::LeaderboardStore;

pub const LEADERBOARD_SIZE: usize = 10;

const SPELL_SUCCESS_BASE: f64 = 100.0;
const LEVEL_MULTIPLIER: f64 = 0.5;
const SPELL_FAIL_PENALTY: u32 = 50;
const VICTORY_BONUS_BASE: u32 = 500;
/// Applied to awards earned while the reference note was enabled.
const REFERENCE_NOTE_MULTIPLIER: f64 = 0.8;

/// One hall-of-fame row. Field names follow the stored browser layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_name: String,
    pub score: u32,
    pub level: usize,
    pub difficulty: Difficulty,
    #[serde(rename = "usedReference")]
    pub used_reference_note: bool,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
}

/// Running score of the current run plus the persisted top-10 leaderboard.
pub struct ScoreEngine {
    current_score: u32,
    top_scores: Vec<ScoreEntry>,
    store: Box<dyn LeaderboardStore>,
}

impl ScoreEngine {
    /// Loads the leaderboard; unreadable data degrades to an empty board.
    pub fn new(store: Box<dyn LeaderboardStore>) -> Self {
        let mut top_scores = store.load().unwrap_or_else(|err| {
            warn!("leaderboard unreadable, starting empty: {err}");
            Vec::new()
        });
        top_scores.sort_by(|a, b| b.score.cmp(&a.score));
        top_scores.truncate(LEADERBOARD_SIZE);

        Self {
            current_score: 0,
            top_scores,
            store,
        }
    }

    pub fn current_score(&self) -> u32 {
        self.current_score
    }

    pub fn top_scores(&self) -> &[ScoreEntry] {
        &self.top_scores
    }

    pub fn reset_score(&mut self) -> u32 {
        self.current_score = 0;
        self.current_score
    }

    pub fn add_spell_success(&mut self, enemy_tier: u32, used_reference_note: bool) -> u32 {
        let multiplier = if used_reference_note {
            REFERENCE_NOTE_MULTIPLIER
        } else {
            1.0
        };
        let points =
            (SPELL_SUCCESS_BASE * (1.0 + enemy_tier as f64 * LEVEL_MULTIPLIER) * multiplier).round();
        self.current_score += points as u32;
        self.current_score
    }

    /// Flat penalty, never below zero.
    pub fn add_spell_failure(&mut self) -> u32 {
        self.current_score = self.current_score.saturating_sub(SPELL_FAIL_PENALTY);
        self.current_score
    }

    // Only the reference-note branch rounds; the plain bonus is already whole.
    pub fn add_victory_bonus(&mut self, enemy_tier: u32, used_reference_note: bool) -> u32 {
        let bonus = VICTORY_BONUS_BASE * (enemy_tier + 1);
        let awarded = if used_reference_note {
            (bonus as f64 * REFERENCE_NOTE_MULTIPLIER).round() as u32
        } else {
            bonus
        };
        self.current_score += awarded;
        self.current_score
    }

    /// Whether `score` would enter the top 10.
    pub fn is_high_score(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.top_scores.len() < LEADERBOARD_SIZE {
            return true;
        }
        self.top_scores.last().is_some_and(|last| score > last.score)
    }

    /// Records the current score under `player_name` and persists the board.
    /// Equal scores keep insertion order.
    pub fn commit_score(&mut self, run: &RunState, player_name: &str) -> ScoreEntry {
        let entry = ScoreEntry {
            player_name: player_name.to_string(),
            score: self.current_score,
            level: run.current_level_index,
            difficulty: run.difficulty,
            used_reference_note: run.play_reference_note,
            timestamp: Utc::now(),
        };

        self.top_scores.push(entry.clone());
        self.top_scores.sort_by(|a, b| b.score.cmp(&a.score));
        self.top_scores.truncate(LEADERBOARD_SIZE);

        match self.store.save(&self.top_scores) {
            Ok(()) => debug!(score = entry.score, "leaderboard saved"),
            Err(err) => warn!("failed to save leaderboard: {err}"),
        }

        entry
    }
}

/// Groups digits in threes: `1234567` becomes `"1,234,567"`.
pub fn format_score(score: u32) -> String {
    let digits = score.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
