//! Encounter state machine.
//!
//! ```text
//! Setup -> [ReferenceNote] -> EnemyCast -> PlayerTurn -> Resolving
//!                                 ^                          |
//!                                 +------- next round -------+--> Victory | Defeat
//! ```
//!
//! Each stage does its synchronous work, then schedules the next one on the
//! orchestrator's own [`Scheduler`]. `cleanup` cancels everything in flight.

use tracing::{debug, info};

use crate::config::Timings;
use crate::event::{params, Caster, Effect, Event};
use crate::input::NoteSource;
use crate::log::push_event;
use crate::model::{EncounterState, Enemy, Note, Outcome, RunState};
use crate::rng::GameRng;
use crate::score::ScoreEngine;
use crate::sequence::{append_player_note, generate_sequence, sequence_length};
use crate::timer::Scheduler;

pub const PLAYER_DAMAGE: (i32, i32) = (20, 30);
pub const ENEMY_DAMAGE: (i32, i32) = (10, 20);

pub const REFERENCE_NOTE: Note = Note::Do;
const REFERENCE_TONE_SECS: f32 = 1.0;
const SPELL_TONE_SECS: f32 = 0.5;
const PLAYER_TONE_SECS: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Setup,
    ReferenceNote,
    EnemyCast,
    PlayerTurn,
    Resolving,
    Victory,
    /// `confirmable` turns true once the continue affordance is on screen.
    Defeat { confirmable: bool },
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    BeginReference,
    PlayReferenceTone,
    StartEnemyCast,
    PlaySequence,
    PlayNote(usize),
    StartPlayerTurn,
    ResolveSuccess,
    ResolveFail,
    FinishVictory,
    OfferDefeatContinue,
    ReturnToStart,
}

/// Control handed back to the run controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handoff {
    Victory { enemy_index: usize },
    ReturnToStart,
}

/// Run-level collaborators an encounter reads and mutates.
pub(crate) struct BattleCtx<'a> {
    pub(crate) run: &'a mut RunState,
    pub(crate) scores: &'a mut ScoreEngine,
    pub(crate) rng: &'a mut GameRng,
    pub(crate) events: &'a mut Vec<Event>,
    pub(crate) timings: &'a Timings,
}

pub struct BattleOrchestrator {
    encounter: Option<EncounterState>,
    phase: Phase,
    timers: Scheduler<Transition>,
}

impl Default for BattleOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleOrchestrator {
    pub fn new() -> Self {
        Self {
            encounter: None,
            phase: Phase::Idle,
            timers: Scheduler::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn encounter(&self) -> Option<&EncounterState> {
        self.encounter.as_ref()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// True between `begin` and the encounter's final resolution.
    pub fn in_progress(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Finished)
    }

    /// Cancels every scheduled transition and drops the encounter.
    pub fn cleanup(&mut self) {
        if self.timers.pending() > 0 {
            debug!(pending = self.timers.pending(), "cancelling scheduled transitions");
        }
        self.timers.cancel_all();
        self.encounter = None;
        self.phase = Phase::Idle;
    }

    /// Setup stage: fresh encounter state, initial render, first timer.
    pub(crate) fn begin(&mut self, enemy_index: usize, enemy: Enemy, ctx: &mut BattleCtx<'_>) {
        self.timers.cancel_all();
        self.phase = Phase::Setup;
        let encounter = EncounterState::new(
            enemy_index,
            enemy,
            ctx.run.player_health,
            ctx.run.player_max_health,
        );
        info!(enemy = enemy.id, "encounter start");

        push_event(
            ctx.events,
            Event::RenderEnemy {
                id: enemy.id,
                glyph: enemy.glyph,
            },
        );
        push_event(ctx.events, health_event(&encounter));
        push_event(ctx.events, Event::message("battle.prepare"));
        push_event(ctx.events, spell_options(false, &[]));
        push_event(
            ctx.events,
            Event::RenderScore {
                score: ctx.scores.current_score(),
            },
        );
        self.encounter = Some(encounter);

        if ctx.run.play_reference_note && !ctx.run.available_notes.is_empty() {
            self.timers
                .schedule(ctx.timings.setup_to_reference, Transition::BeginReference);
        } else {
            self.timers
                .schedule(ctx.timings.setup_to_cast, Transition::StartEnemyCast);
        }
    }

    /// Player note from pointer or keyboard.
    pub(crate) fn player_input(
        &mut self,
        note: Note,
        source: NoteSource,
        ctx: &mut BattleCtx<'_>,
    ) -> Outcome {
        if self.phase != Phase::PlayerTurn || !ctx.run.available_notes.contains(&note) {
            return Outcome::Ignored;
        }
        let Some(encounter) = self.encounter.as_mut() else {
            return Outcome::Ignored;
        };
        if !encounter.accepts_input() {
            return Outcome::Ignored;
        }
        if source == NoteSource::Keyboard
            && encounter.player_sequence.len() >= encounter.spell_sequence.len()
        {
            return Outcome::Ignored;
        }

        push_event(
            ctx.events,
            Event::PlayTone {
                note,
                duration: PLAYER_TONE_SECS,
                source: Some(source),
            },
        );

        let outcome = append_player_note(encounter, note);
        match outcome {
            Outcome::Fail => {
                push_event(ctx.events, spell_options(false, &[]));
                self.phase = Phase::Resolving;
                self.timers
                    .schedule(ctx.timings.input_to_resolution, Transition::ResolveFail);
            }
            Outcome::Success => {
                encounter.is_player_turn = false;
                self.phase = Phase::Resolving;
                self.timers
                    .schedule(ctx.timings.input_to_resolution, Transition::ResolveSuccess);
            }
            Outcome::Pending | Outcome::Ignored => {}
        }
        outcome
    }

    /// Developer shortcut: completes the current spell as if typed correctly.
    pub(crate) fn auto_complete(&mut self, timings: &Timings) -> Outcome {
        if self.phase != Phase::PlayerTurn {
            return Outcome::Ignored;
        }
        let Some(encounter) = self.encounter.as_mut() else {
            return Outcome::Ignored;
        };
        if !encounter.accepts_input() {
            return Outcome::Ignored;
        }

        encounter.player_sequence = encounter.spell_sequence.clone();
        encounter.is_player_turn = false;
        self.phase = Phase::Resolving;
        self.timers
            .schedule(timings.input_to_resolution, Transition::ResolveSuccess);
        Outcome::Success
    }

    /// Confirms a defeat once the continue affordance is showing.
    /// Returns the index of the enemy that won.
    pub(crate) fn confirm_defeat(&mut self) -> Option<usize> {
        if self.phase != (Phase::Defeat { confirmable: true }) {
            return None;
        }
        self.phase = Phase::Finished;
        self.encounter.as_ref().map(|e| e.enemy_index)
    }

    pub(crate) fn schedule_return_to_start(&mut self, delay_ms: u64) {
        self.timers.schedule(delay_ms, Transition::ReturnToStart);
    }

    /// Moves the clock forward without a run to act on.
    pub(crate) fn skip_time(&mut self, dt_ms: u64) {
        let until = self.timers.now_ms().saturating_add(dt_ms);
        self.timers.settle(until);
    }

    /// Fires every transition due in the next `dt_ms`, including ones
    /// scheduled by transitions fired during this call.
    pub(crate) fn advance(&mut self, dt_ms: u64, ctx: &mut BattleCtx<'_>) -> Vec<Handoff> {
        let until = self.timers.now_ms().saturating_add(dt_ms);
        let mut handoffs = Vec::new();
        while let Some(transition) = self.timers.pop_due(until) {
            if let Some(handoff) = self.fire(transition, ctx) {
                handoffs.push(handoff);
            }
        }
        self.timers.settle(until);
        handoffs
    }

    fn fire(&mut self, transition: Transition, ctx: &mut BattleCtx<'_>) -> Option<Handoff> {
        debug!(?transition, phase = ?self.phase, "transition");
        if transition == Transition::ReturnToStart {
            return Some(Handoff::ReturnToStart);
        }

        // Timers only exist while an encounter does; a stray one is a no-op.
        let encounter = self.encounter.as_mut()?;
        let timings = ctx.timings;

        match transition {
            Transition::BeginReference => {
                self.phase = Phase::ReferenceNote;
                push_event(ctx.events, Event::message("battle.referenceNote"));
                self.timers
                    .schedule(timings.reference_tone_delay, Transition::PlayReferenceTone);
            }
            Transition::PlayReferenceTone => {
                push_event(
                    ctx.events,
                    Event::PlayTone {
                        note: REFERENCE_NOTE,
                        duration: REFERENCE_TONE_SECS,
                        source: None,
                    },
                );
                self.timers
                    .schedule(timings.reference_to_cast, Transition::StartEnemyCast);
            }
            Transition::StartEnemyCast => {
                self.phase = Phase::EnemyCast;
                push_event(
                    ctx.events,
                    Event::RenderMessage {
                        key: "battle.enemyTurn",
                        params: params([("enemy", encounter.enemy.id.to_string())]),
                    },
                );
                encounter.is_player_turn = false;
                encounter.player_sequence.clear();
                let length = sequence_length(ctx.run.difficulty, &encounter.enemy);
                encounter.spell_sequence =
                    generate_sequence(ctx.rng, &ctx.run.available_notes, length);
                debug!(length, "spell generated");
                self.timers
                    .schedule(timings.cast_to_playback, Transition::PlaySequence);
            }
            Transition::PlaySequence => {
                push_event(ctx.events, spell_options(false, &[]));
                if encounter.spell_sequence.is_empty() {
                    self.timers
                        .schedule(timings.playback_to_player, Transition::StartPlayerTurn);
                } else {
                    self.timers
                        .schedule(timings.note_interval, Transition::PlayNote(0));
                }
            }
            Transition::PlayNote(idx) => {
                if let Some(&note) = encounter.spell_sequence.get(idx) {
                    push_event(
                        ctx.events,
                        Event::PlayTone {
                            note,
                            duration: SPELL_TONE_SECS,
                            source: None,
                        },
                    );
                }
                if idx + 1 < encounter.spell_sequence.len() {
                    self.timers
                        .schedule(timings.note_interval, Transition::PlayNote(idx + 1));
                } else {
                    self.timers
                        .schedule(timings.playback_to_player, Transition::StartPlayerTurn);
                }
            }
            Transition::StartPlayerTurn => {
                self.phase = Phase::PlayerTurn;
                encounter.is_player_turn = true;
                encounter.player_sequence.clear();
                encounter.has_failed = false;
                push_event(ctx.events, Event::message("battle.playerTurn"));
                push_event(ctx.events, spell_options(true, &ctx.run.available_notes));
            }
            Transition::ResolveSuccess => {
                push_event(ctx.events, Event::PlayEffect { effect: Effect::Success });
                push_event(ctx.events, spell_options(false, &[]));

                let damage = ctx.rng.roll_damage(PLAYER_DAMAGE.0, PLAYER_DAMAGE.1);
                encounter.enemy_health = (encounter.enemy_health - damage).max(0);
                push_event(ctx.events, Event::MagicEffect { caster: Caster::Player });
                push_event(
                    ctx.events,
                    Event::RenderMessage {
                        key: "battle.spellHit",
                        params: params([("damage", damage.to_string())]),
                    },
                );
                push_event(ctx.events, health_event(encounter));

                let tier = encounter.enemy.difficulty_tier;
                let reference = ctx.run.play_reference_note;
                let score = ctx.scores.add_spell_success(tier, reference);
                push_event(ctx.events, Event::RenderScore { score });
                debug!(damage, enemy_health = encounter.enemy_health, score, "spell hit");

                if encounter.enemy_health == 0 {
                    encounter.is_player_turn = false;
                    self.phase = Phase::Victory;
                    push_event(ctx.events, Event::message("battle.victory"));
                    let score = ctx.scores.add_victory_bonus(tier, reference);
                    push_event(ctx.events, Event::RenderScore { score });
                    self.timers
                        .schedule(timings.resolution_pause, Transition::FinishVictory);
                } else {
                    self.timers
                        .schedule(timings.resolution_pause, Transition::StartEnemyCast);
                }
            }
            Transition::ResolveFail => {
                push_event(ctx.events, Event::PlayEffect { effect: Effect::Fail });
                push_event(ctx.events, spell_options(false, &[]));

                let damage = ctx.rng.roll_damage(ENEMY_DAMAGE.0, ENEMY_DAMAGE.1);
                encounter.player_health = (encounter.player_health - damage).max(0);
                ctx.run.player_health = encounter.player_health;
                push_event(ctx.events, Event::MagicEffect { caster: Caster::Enemy });
                push_event(
                    ctx.events,
                    Event::RenderMessage {
                        key: "battle.spellFail",
                        params: params([("damage", damage.to_string())]),
                    },
                );
                push_event(ctx.events, health_event(encounter));

                let score = ctx.scores.add_spell_failure();
                push_event(ctx.events, Event::RenderScore { score });
                debug!(damage, player_health = encounter.player_health, score, "spell failed");

                if encounter.player_health == 0 {
                    encounter.is_player_turn = false;
                    self.phase = Phase::Defeat { confirmable: false };
                    self.timers
                        .schedule(timings.resolution_pause, Transition::OfferDefeatContinue);
                } else {
                    self.timers
                        .schedule(timings.resolution_pause, Transition::StartEnemyCast);
                }
            }
            Transition::FinishVictory => {
                push_event(ctx.events, Event::PlayEffect { effect: Effect::Win });
                ctx.run.defeated_enemy_indices.insert(encounter.enemy_index);
                self.phase = Phase::Finished;
                info!(enemy = encounter.enemy.id, "encounter won");
                return Some(Handoff::Victory {
                    enemy_index: encounter.enemy_index,
                });
            }
            Transition::OfferDefeatContinue => {
                push_event(ctx.events, Event::ShowContinue);
                self.phase = Phase::Defeat { confirmable: true };
                info!(enemy = encounter.enemy.id, "encounter lost");
            }
            Transition::ReturnToStart => {}
        }
        None
    }
}

fn health_event(encounter: &EncounterState) -> Event {
    Event::RenderHealth {
        player: encounter.player_health,
        player_max: encounter.player_max_health,
        enemy: encounter.enemy_health,
        enemy_max: encounter.enemy_max_health,
    }
}

fn spell_options(enabled: bool, notes: &[Note]) -> Event {
    Event::RenderSpellOptions {
        enabled,
        notes: notes.to_vec(),
    }
}
