//! Handle-based API for the browser host.
//!
//! The host creates a game, forwards user actions, and calls [`step`] from its
//! animation loop with the elapsed milliseconds. Every mutating call returns
//! the events queued since the previous call as JSON lines.

use wasm_bindgen::prelude::*;

use crate::config::{GameConfig, GAME_VERSION};
use crate::event::Event;
use crate::log::log_line;
use crate::model::{Difficulty, Note};
use crate::run::Game;
use crate::storage::MemoryStore;

mod manager;
mod snapshot;

#[wasm_bindgen(getter_with_clone)]
pub struct StepResult {
    pub events: Vec<String>,
    pub need_input: bool,
    pub ended: bool,
    pub error: String,
}

#[wasm_bindgen(getter_with_clone)]
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub screen: String,
    pub phase: String,
    pub difficulty: String,
    pub current_level: u32,
    pub defeated: Vec<u32>,
    pub score: u32,
    pub enemy_id: String,
    pub player_health: i32,
    pub player_max_health: i32,
    pub enemy_health: i32,
    pub enemy_max_health: i32,
    pub spell_length: u32,
    pub player_progress: u32,
    pub need_input: bool,
    pub developer_mode: bool,
}

fn collect(game: &mut Game, error: String) -> StepResult {
    let events = game
        .drain_events()
        .iter()
        .map(Event::to_json_line)
        .collect();
    StepResult {
        events,
        need_input: game.encounter().is_some_and(|e| e.accepts_input()),
        ended: game.run().is_none() || game.run_over(),
        error,
    }
}

fn invalid_handle(handle: u32) -> StepResult {
    StepResult {
        events: Vec::new(),
        need_input: false,
        ended: true,
        error: format!("invalid_handle:{handle}"),
    }
}

fn with_step(handle: u32, f: impl FnOnce(&mut Game) -> String) -> StepResult {
    manager::with_game_mut(handle, |game| {
        let error = f(game);
        collect(game, error)
    })
    .unwrap_or_else(|| invalid_handle(handle))
}

/// Creates a game and returns its handle, or 0 if `config_toml` is invalid.
/// `leaderboard_blob` is the stored hall of fame (may be empty).
#[wasm_bindgen]
pub fn create_game(seed: u32, leaderboard_blob: &str, config_toml: &str) -> u32 {
    let config = match GameConfig::from_toml_str(config_toml) {
        Ok(config) => config,
        Err(err) => {
            log_line(&format!("[create_game] {err}"));
            return 0;
        }
    };
    let store = MemoryStore::from_blob(leaderboard_blob);
    manager::insert_game(Game::new(config, seed as u64, Box::new(store)))
}

#[wasm_bindgen]
pub fn destroy_game(handle: u32) {
    manager::destroy_game(handle);
}

#[wasm_bindgen]
pub fn game_version() -> String {
    GAME_VERSION.to_string()
}

#[wasm_bindgen]
pub fn step(handle: u32, dt_ms: u32) -> StepResult {
    with_step(handle, |game| {
        game.advance(dt_ms as u64);
        String::new()
    })
}

#[wasm_bindgen]
pub fn set_difficulty(handle: u32, difficulty: &str) -> StepResult {
    with_step(handle, |game| match difficulty.parse::<Difficulty>() {
        Ok(difficulty) => {
            game.set_difficulty(difficulty);
            String::new()
        }
        Err(_) => format!("invalid_difficulty:{difficulty}"),
    })
}

#[wasm_bindgen]
pub fn set_reference_note(handle: u32, enabled: bool) -> StepResult {
    with_step(handle, |game| {
        game.set_reference_note(enabled);
        String::new()
    })
}

#[wasm_bindgen]
pub fn start_run(handle: u32, difficulty: &str) -> StepResult {
    with_step(handle, |game| match difficulty.parse::<Difficulty>() {
        Ok(difficulty) => {
            game.start_run(difficulty);
            String::new()
        }
        Err(_) => format!("invalid_difficulty:{difficulty}"),
    })
}

#[wasm_bindgen]
pub fn select_enemy(handle: u32, index: u32) -> StepResult {
    with_step(handle, |game| {
        game.select_enemy(index as usize);
        String::new()
    })
}

#[wasm_bindgen]
pub fn press_note(handle: u32, note: &str) -> StepResult {
    with_step(handle, |game| match note.parse::<Note>() {
        Ok(note) => {
            game.press_note(note);
            String::new()
        }
        Err(_) => format!("invalid_note:{note}"),
    })
}

#[wasm_bindgen]
pub fn press_key(handle: u32, key: &str) -> StepResult {
    with_step(handle, |game| {
        game.press_key(key);
        String::new()
    })
}

#[wasm_bindgen]
pub fn confirm_defeat(handle: u32) -> StepResult {
    with_step(handle, |game| {
        game.confirm_defeat();
        String::new()
    })
}

#[wasm_bindgen]
pub fn submit_player_name(handle: u32, name: &str) -> StepResult {
    with_step(handle, |game| match game.submit_player_name(name) {
        Ok(_) => String::new(),
        Err(crate::error::GameError::EmptyPlayerName) => "empty_player_name".to_string(),
        Err(err) => err.to_string(),
    })
}

#[wasm_bindgen]
pub fn cancel_inscription(handle: u32) -> StepResult {
    with_step(handle, |game| {
        game.cancel_inscription();
        String::new()
    })
}

#[wasm_bindgen]
pub fn next_battle(handle: u32) -> StepResult {
    with_step(handle, |game| {
        game.next_battle();
        String::new()
    })
}

#[wasm_bindgen]
pub fn return_to_menu(handle: u32) -> StepResult {
    with_step(handle, |game| {
        game.return_to_menu();
        String::new()
    })
}

#[wasm_bindgen]
pub fn get_snapshot(handle: u32) -> Option<Snapshot> {
    manager::with_game(handle, snapshot::snapshot)
}

/// Hall of fame as the JSON blob the host persists.
#[wasm_bindgen]
pub fn get_leaderboard_blob(handle: u32) -> String {
    manager::with_game(handle, |game| {
        serde_json::to_string(game.scores().top_scores()).unwrap_or_else(|err| {
            log_line(&format!("[get_leaderboard_blob] {err}"));
            "[]".to_string()
        })
    })
    .unwrap_or_else(|| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_until_player_turn(handle: u32) {
        for _ in 0..200 {
            if get_snapshot(handle).is_some_and(|s| s.need_input) {
                return;
            }
            step(handle, 100);
        }
        panic!("player turn never started");
    }

    #[test]
    fn bad_config_yields_null_handle() {
        assert_eq!(create_game(1, "", "player_max_health = [1]"), 0);
        assert_eq!(step(0, 10).error, "invalid_handle:0");
    }

    #[test]
    fn first_step_delivers_start_screen_events() {
        let handle = create_game(3, "", "");
        let result = step(handle, 0);
        assert_eq!(
            result.events,
            vec![
                r#"{"kind":"RenderLeaderboard","entries":[]}"#.to_string(),
                r#"{"kind":"ShowScreen","screen":"start"}"#.to_string(),
            ]
        );
        assert!(result.ended);
        destroy_game(handle);
    }

    #[test]
    fn unknown_names_are_reported() {
        let handle = create_game(3, "", "");
        assert_eq!(start_run(handle, "legendary").error, "invalid_difficulty:legendary");
        start_run(handle, "novice");
        assert_eq!(press_note(handle, "ut").error, "invalid_note:ut");
        destroy_game(handle);
    }

    #[test]
    fn spell_round_trip_through_handle_api() {
        let handle = create_game(20260213, "", "play_reference_note = false");
        start_run(handle, "novice");
        select_enemy(handle, 0);
        play_until_player_turn(handle);

        let spell: Vec<Note> = manager::with_game(handle, |g| {
            g.encounter().unwrap().spell_sequence.clone()
        })
        .unwrap();
        for note in &spell {
            press_note(handle, note.as_str());
        }
        let result = step(handle, 500);
        assert!(result
            .events
            .iter()
            .any(|line| line.contains(r#""key":"battle.spellHit""#)));

        let snap = get_snapshot(handle).unwrap();
        assert_eq!(snap.phase, "resolving");
        assert!(snap.enemy_health < snap.enemy_max_health);
        assert_eq!(snap.score, 150);
        destroy_game(handle);
        assert!(get_snapshot(handle).is_none());
    }

    #[test]
    fn menu_settings_report_like_other_actions() {
        let handle = create_game(3, "", "");
        step(handle, 0);
        let result = set_reference_note(handle, false);
        assert!(result.error.is_empty());
        assert!(result.events.is_empty());
        assert!(!manager::with_game(handle, |g| g.settings().play_reference_note).unwrap());
        destroy_game(handle);

        assert_eq!(set_reference_note(handle, true).error, format!("invalid_handle:{handle}"));
    }

    #[test]
    fn leaderboard_blob_survives_round_trip() {
        let blob = r#"[{"playerName":"Ana","score":900,"level":2,"difficulty":"adept","usedReference":false,"date":"2025-01-01T00:00:00Z"}]"#;
        let handle = create_game(1, blob, "");
        let exported = get_leaderboard_blob(handle);
        assert!(exported.contains(r#""playerName":"Ana""#));
        assert!(exported.contains(r#""usedReference":false"#));
        destroy_game(handle);
        assert_eq!(get_leaderboard_blob(handle), "[]");
    }
}
