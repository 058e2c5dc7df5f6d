use tracing::{debug, info, warn};

use crate::battle::{BattleCtx, BattleOrchestrator, Handoff, Phase};
use crate::config::GameConfig;
use crate::enemies::ENEMIES;
use crate::error::{GameError, Result};
use crate::event::{params, Effect, Event};
use crate::input::{note_for_key, NoteSource};
use crate::log::push_event;
use crate::model::{Difficulty, EncounterState, Enemy, Note, Outcome, RunState, Screen};
use crate::rng::GameRng;
use crate::score::{format_score, ScoreEngine, ScoreEntry};
use crate::storage::LeaderboardStore;

/// Choices made on the start screen, applied by the next `start_run`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuSettings {
    pub difficulty: Difficulty,
    pub play_reference_note: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingInscription {
    pub score: u32,
    /// 1-based level shown next to the score.
    pub level: usize,
}

/// Campaign controller: owns the run, the score engine and the encounter
/// orchestrator, and routes between screens.
///
/// Every call queues presentation/audio [`Event`]s; hosts collect them with
/// [`Game::drain_events`].
pub struct Game {
    config: GameConfig,
    enemies: &'static [Enemy],
    settings: MenuSettings,
    run: Option<RunState>,
    battle: BattleOrchestrator,
    scores: ScoreEngine,
    rng: GameRng,
    screen: Screen,
    inscription: Option<PendingInscription>,
    /// Set once the run reaches a final result; the map stays closed.
    run_over: bool,
    developer_mode_active: bool,
    events: Vec<Event>,
}

impl Game {
    pub fn new(config: GameConfig, seed: u64, store: Box<dyn LeaderboardStore>) -> Self {
        let settings = MenuSettings {
            difficulty: config.default_difficulty,
            play_reference_note: config.play_reference_note,
        };
        let mut game = Self {
            config,
            enemies: &ENEMIES,
            settings,
            run: None,
            battle: BattleOrchestrator::new(),
            scores: ScoreEngine::new(store),
            rng: GameRng::new(seed),
            screen: Screen::Start,
            inscription: None,
            run_over: false,
            developer_mode_active: false,
            events: Vec::new(),
        };
        game.render_leaderboard();
        game.show(Screen::Start);
        game
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn enemies(&self) -> &'static [Enemy] {
        self.enemies
    }

    pub fn settings(&self) -> MenuSettings {
        self.settings
    }

    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn encounter(&self) -> Option<&EncounterState> {
        self.battle.encounter()
    }

    pub fn phase(&self) -> Phase {
        self.battle.phase()
    }

    pub fn scores(&self) -> &ScoreEngine {
        &self.scores
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn pending_inscription(&self) -> Option<PendingInscription> {
        self.inscription
    }

    /// True after a final victory or a confirmed defeat, until the run is
    /// torn down.
    pub fn run_over(&self) -> bool {
        self.run_over
    }

    pub fn developer_mode_active(&self) -> bool {
        self.developer_mode_active
    }

    pub fn pending_timers(&self) -> usize {
        self.battle.pending_timers()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.difficulty = difficulty;
    }

    pub fn set_reference_note(&mut self, enabled: bool) {
        self.settings.play_reference_note = enabled;
    }

    /// Starts a fresh run: new run state, zero score, enemy map at level 0.
    pub fn start_run(&mut self, difficulty: Difficulty) {
        self.battle.cleanup();
        self.settings.difficulty = difficulty;
        self.run = Some(RunState::new(
            difficulty,
            self.settings.play_reference_note,
            self.config.player_max_health,
        ));
        self.scores.reset_score();
        self.inscription = None;
        self.run_over = false;
        self.developer_mode_active = false;
        info!(%difficulty, reference = self.settings.play_reference_note, "run start");

        self.render_map();
        self.show(Screen::Map);
    }

    /// Starts an encounter against an unlocked enemy. Locked or unknown
    /// indices, selections while an encounter is running, and selections
    /// after the run ended are ignored.
    pub fn select_enemy(&mut self, index: usize) -> bool {
        if self.run_over {
            debug!(index, "enemy selection ignored, run is over");
            return false;
        }
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        let Some(&enemy) = self.enemies.get(index) else {
            return false;
        };
        if !run.is_unlocked(index) || self.battle.in_progress() {
            debug!(index, unlocked = run.current_level_index, "enemy selection ignored");
            return false;
        }

        let mut ctx = BattleCtx {
            run,
            scores: &mut self.scores,
            rng: &mut self.rng,
            events: &mut self.events,
            timings: &self.config.timings,
        };
        self.battle.begin(index, enemy, &mut ctx);
        self.show(Screen::Battle);
        true
    }

    /// Note chosen on a spell button.
    pub fn press_note(&mut self, note: Note) -> Outcome {
        self.note_input(note, NoteSource::Pointer)
    }

    /// Raw key press: developer keys first, then the note keyboard mapping.
    pub fn press_key(&mut self, key: &str) -> Outcome {
        let dev = &self.config.developer_mode;
        let is_toggle = dev.enabled && key == dev.toggle_key;
        let is_auto_complete = key.eq_ignore_ascii_case(&dev.auto_complete_key);

        if is_toggle && self.run.is_some() {
            self.toggle_developer_mode();
            return Outcome::Ignored;
        }
        if self.developer_mode_active && is_auto_complete {
            return self.battle.auto_complete(&self.config.timings);
        }

        match note_for_key(key) {
            Some(note) => self.note_input(note, NoteSource::Keyboard),
            None => Outcome::Ignored,
        }
    }

    fn note_input(&mut self, note: Note, source: NoteSource) -> Outcome {
        let Some(run) = self.run.as_mut() else {
            return Outcome::Ignored;
        };
        let mut ctx = BattleCtx {
            run,
            scores: &mut self.scores,
            rng: &mut self.rng,
            events: &mut self.events,
            timings: &self.config.timings,
        };
        self.battle.player_input(note, source, &mut ctx)
    }

    fn toggle_developer_mode(&mut self) {
        self.developer_mode_active = !self.developer_mode_active;
        let key = if self.developer_mode_active {
            "developer.enabled"
        } else {
            "developer.disabled"
        };
        info!(active = self.developer_mode_active, "developer mode toggled");
        push_event(&mut self.events, Event::message(key));
    }

    /// Advances the game clock by `dt_ms`, firing due transitions.
    pub fn advance(&mut self, dt_ms: u64) {
        let Some(run) = self.run.as_mut() else {
            self.battle.skip_time(dt_ms);
            return;
        };
        let mut ctx = BattleCtx {
            run,
            scores: &mut self.scores,
            rng: &mut self.rng,
            events: &mut self.events,
            timings: &self.config.timings,
        };
        let handoffs = self.battle.advance(dt_ms, &mut ctx);
        for handoff in handoffs {
            match handoff {
                Handoff::Victory { enemy_index } => self.finish_victory(enemy_index),
                Handoff::ReturnToStart => self.end_run(),
            }
        }
    }

    fn finish_victory(&mut self, enemy_index: usize) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        run.current_level_index = run.current_level_index.max(enemy_index + 1);
        let score = self.scores.current_score();

        if enemy_index + 1 < self.enemies.len() {
            self.render_map();
            self.show(Screen::Map);
            return;
        }

        info!(score, "campaign complete");
        self.run_over = true;
        if self.scores.is_high_score(score) {
            self.show_inscription(score, self.enemies.len());
        } else {
            push_event(
                &mut self.events,
                Event::RenderResult {
                    title_key: "victory",
                    message_key: "battle.finalVictory",
                    show_continue: false,
                    params: params([("score", format_score(score))]),
                },
            );
            self.show(Screen::Result);
        }
    }

    /// Player acknowledged the defeat message.
    pub fn confirm_defeat(&mut self) -> bool {
        let Some(enemy_index) = self.battle.confirm_defeat() else {
            return false;
        };
        self.run_over = true;
        let score = self.scores.current_score();
        push_event(&mut self.events, Event::PlayEffect { effect: Effect::Lose });

        if self.scores.is_high_score(score) {
            self.show_inscription(score, enemy_index + 1);
            return true;
        }

        let enemy_id = self.enemies.get(enemy_index).map(|e| e.id).unwrap_or_default();
        push_event(
            &mut self.events,
            Event::RenderResult {
                title_key: "battle.defeat",
                message_key: "battle.defeatNotHighScore",
                show_continue: false,
                params: params([
                    ("enemy", enemy_id.to_string()),
                    ("score", format_score(score)),
                ]),
            },
        );
        self.show(Screen::Result);
        true
    }

    fn show_inscription(&mut self, score: u32, level: usize) {
        self.inscription = Some(PendingInscription { score, level });
        push_event(&mut self.events, Event::ShowInscription { score, level });
        self.show(Screen::Inscription);
    }

    /// Records the pending score under `name`.
    ///
    /// Blank names are rejected with a prompt and change nothing. Without a
    /// pending inscription the game falls back to the start screen and
    /// returns `Ok(None)`.
    pub fn submit_player_name(&mut self, name: &str) -> Result<Option<ScoreEntry>> {
        let (Some(_), Some(run)) = (self.inscription, self.run.as_ref()) else {
            warn!("no pending inscription, returning to start screen");
            self.end_run();
            return Ok(None);
        };

        let name = name.trim();
        if name.is_empty() {
            push_event(
                &mut self.events,
                Event::NamePrompt {
                    key: "hallOfFame.enterNameAlert",
                },
            );
            return Err(GameError::EmptyPlayerName);
        }

        let entry = self.scores.commit_score(run, name);
        self.inscription = None;
        info!(player = name, score = entry.score, "score inscribed");
        self.render_leaderboard();
        push_event(&mut self.events, Event::PlayEffect { effect: Effect::Success });
        self.battle
            .schedule_return_to_start(self.config.timings.inscription_return);
        Ok(Some(entry))
    }

    /// Leaves the inscription screen without recording; the run ends.
    pub fn cancel_inscription(&mut self) {
        self.end_run();
    }

    /// Back to the enemy map after a won encounter. Ignored once the run
    /// is over.
    pub fn next_battle(&mut self) {
        if self.run.is_none() || self.run_over || self.battle.in_progress() {
            return;
        }
        self.render_map();
        self.show(Screen::Map);
    }

    /// Abandons the run and shows the start screen.
    pub fn return_to_menu(&mut self) {
        self.end_run();
    }

    fn end_run(&mut self) {
        self.cleanup();
        self.run = None;
        self.run_over = false;
        self.inscription = None;
        self.show(Screen::Start);
    }

    /// Cancels every scheduled transition. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        self.battle.cleanup();
    }

    fn show(&mut self, screen: Screen) {
        self.screen = screen;
        push_event(&mut self.events, Event::ShowScreen { screen });
    }

    fn render_map(&mut self) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        push_event(
            &mut self.events,
            Event::RenderProgressMap {
                enemies: self.enemies.to_vec(),
                current_level: run.current_level_index,
                defeated: run.defeated_enemy_indices.clone(),
                score: self.scores.current_score(),
            },
        );
    }

    fn render_leaderboard(&mut self) {
        push_event(
            &mut self.events,
            Event::RenderLeaderboard {
                entries: self.scores.top_scores().to_vec(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn game() -> Game {
        Game::new(GameConfig::default(), 11, Box::new(MemoryStore::new()))
    }

    fn dev_game() -> Game {
        let mut config = GameConfig::default();
        config.developer_mode.enabled = true;
        config.play_reference_note = false;
        Game::new(config, 11, Box::new(MemoryStore::new()))
    }

    fn reach_player_turn(game: &mut Game) {
        for _ in 0..200 {
            if game.phase() == Phase::PlayerTurn {
                return;
            }
            game.advance(100);
        }
        panic!("player turn never started");
    }

    #[test]
    fn new_game_shows_start_screen_and_leaderboard() {
        let mut game = game();
        let events = game.drain_events();
        assert_eq!(
            events,
            vec![
                Event::RenderLeaderboard { entries: vec![] },
                Event::ShowScreen {
                    screen: Screen::Start
                },
            ]
        );
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn start_run_resets_state_and_shows_map() {
        let mut game = game();
        game.set_reference_note(false);
        game.start_run(Difficulty::Adept);

        let run = game.run().unwrap();
        assert_eq!(run.current_level_index, 0);
        assert_eq!(run.available_notes.len(), 5);
        assert!(!run.play_reference_note);
        assert_eq!(game.scores().current_score(), 0);
        assert_eq!(game.screen(), Screen::Map);
    }

    #[test]
    fn locked_enemy_selection_leaves_run_untouched() {
        let mut game = game();
        game.start_run(Difficulty::Novice);
        let before = game.run().cloned();

        assert!(!game.select_enemy(1));
        assert!(!game.select_enemy(9));
        assert_eq!(game.run().cloned(), before);
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.screen(), Screen::Map);
    }

    #[test]
    fn selection_is_ignored_mid_encounter() {
        let mut game = game();
        game.start_run(Difficulty::Novice);
        assert!(game.select_enemy(0));
        assert!(!game.select_enemy(0));
    }

    #[test]
    fn keyboard_input_maps_letters_to_notes() {
        let mut game = game();
        game.start_run(Difficulty::Novice);
        game.select_enemy(0);
        reach_player_turn(&mut game);

        let spell = game.encounter().unwrap().spell_sequence.clone();
        let key = if spell[0] == Note::Do { "c" } else { "d" };
        assert_eq!(game.press_key(key), Outcome::Pending);
        assert_eq!(game.press_key("g"), Outcome::Ignored);
        assert_eq!(game.encounter().unwrap().player_sequence, vec![spell[0]]);
    }

    #[test]
    fn developer_mode_toggles_only_when_enabled() {
        let mut game = game();
        game.start_run(Difficulty::Novice);
        game.press_key("F2");
        assert!(!game.developer_mode_active());

        let mut game = dev_game();
        game.start_run(Difficulty::Novice);
        game.drain_events();
        game.press_key("F2");
        assert!(game.developer_mode_active());
        assert_eq!(game.drain_events(), vec![Event::message("developer.enabled")]);
        game.press_key("F2");
        assert!(!game.developer_mode_active());
    }

    #[test]
    fn auto_complete_resolves_spell_as_success() {
        let mut game = dev_game();
        game.start_run(Difficulty::Novice);
        game.select_enemy(0);
        game.press_key("F2");
        reach_player_turn(&mut game);

        assert_eq!(game.press_key("x"), Outcome::Success);
        let enc = game.encounter().unwrap();
        assert_eq!(enc.player_sequence, enc.spell_sequence);

        game.advance(500);
        let enc = game.encounter().unwrap();
        assert!(enc.enemy_health < enc.enemy_max_health);
    }

    #[test]
    fn empty_name_is_rejected_without_state_change() {
        let mut game = dev_game();
        game.start_run(Difficulty::Novice);
        game.inscription = Some(PendingInscription { score: 300, level: 1 });
        game.drain_events();

        let err = game.submit_player_name("   ").unwrap_err();
        assert!(matches!(err, GameError::EmptyPlayerName));
        assert!(game.scores().top_scores().is_empty());
        assert!(game.pending_inscription().is_some());
        assert_eq!(
            game.drain_events(),
            vec![Event::NamePrompt {
                key: "hallOfFame.enterNameAlert"
            }]
        );
    }

    #[test]
    fn submitted_name_is_trimmed_and_returns_to_start() {
        let mut game = dev_game();
        game.start_run(Difficulty::Novice);
        game.inscription = Some(PendingInscription { score: 0, level: 1 });

        let entry = game.submit_player_name("  Clara ").unwrap().unwrap();
        assert_eq!(entry.player_name, "Clara");
        assert_eq!(game.scores().top_scores().len(), 1);

        game.advance(499);
        assert_eq!(game.screen(), Screen::Map);
        game.advance(1);
        assert_eq!(game.screen(), Screen::Start);
        assert!(game.run().is_none());
    }

    #[test]
    fn submit_without_pending_inscription_falls_back_to_start() {
        let mut game = game();
        game.start_run(Difficulty::Novice);
        assert!(game.submit_player_name("Nobody").unwrap().is_none());
        assert_eq!(game.screen(), Screen::Start);
        assert!(game.run().is_none());
        assert!(game.scores().top_scores().is_empty());
    }

    #[test]
    fn cancelled_inscription_discards_run() {
        let mut game = game();
        game.start_run(Difficulty::Novice);
        game.run_over = true;
        game.inscription = Some(PendingInscription { score: 120, level: 1 });

        game.cancel_inscription();
        assert!(game.run().is_none());
        assert!(game.pending_inscription().is_none());
        assert!(!game.run_over());
        assert_eq!(game.screen(), Screen::Start);

        assert!(!game.select_enemy(0));
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.screen(), Screen::Start);
    }

    #[test]
    fn finished_run_keeps_map_closed() {
        let mut game = game();
        game.start_run(Difficulty::Novice);
        game.run_over = true;
        game.drain_events();

        game.next_battle();
        assert!(!game.select_enemy(0));
        assert!(game.drain_events().is_empty());
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.screen(), Screen::Map);

        game.start_run(Difficulty::Novice);
        assert!(!game.run_over());
        assert!(game.select_enemy(0));
    }

    #[test]
    fn return_to_menu_cancels_timers() {
        let mut game = game();
        game.start_run(Difficulty::Novice);
        game.select_enemy(0);
        assert!(game.pending_timers() > 0);

        game.return_to_menu();
        assert_eq!(game.pending_timers(), 0);
        game.drain_events();
        game.advance(60_000);
        assert!(game.drain_events().is_empty());
        assert_eq!(game.screen(), Screen::Start);
    }
}
