use crate::battle::Phase;
use crate::run::Game;
use crate::step_api::Snapshot;

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Setup => "setup",
        Phase::ReferenceNote => "reference_note",
        Phase::EnemyCast => "enemy_cast",
        Phase::PlayerTurn => "player_turn",
        Phase::Resolving => "resolving",
        Phase::Victory => "victory",
        Phase::Defeat { .. } => "defeat",
        Phase::Finished => "finished",
    }
}

pub(super) fn snapshot(game: &Game) -> Snapshot {
    let (current_level, defeated, difficulty): (u32, Vec<u32>, String) = match game.run() {
        Some(run) => (
            run.current_level_index as u32,
            run.defeated_enemy_indices.iter().map(|&i| i as u32).collect(),
            run.difficulty.as_str().to_string(),
        ),
        None => (0, Vec::new(), game.settings().difficulty.as_str().to_string()),
    };

    let mut snap = Snapshot {
        screen: game.screen().as_str().to_string(),
        phase: phase_label(game.phase()).to_string(),
        difficulty,
        current_level,
        defeated,
        score: game.scores().current_score(),
        enemy_id: String::new(),
        player_health: game.run().map(|r| r.player_health).unwrap_or(0),
        player_max_health: game.config().player_max_health,
        enemy_health: 0,
        enemy_max_health: 0,
        spell_length: 0,
        player_progress: 0,
        need_input: false,
        developer_mode: game.developer_mode_active(),
    };

    if let Some(encounter) = game.encounter() {
        snap.enemy_id = encounter.enemy.id.to_string();
        snap.player_health = encounter.player_health;
        snap.player_max_health = encounter.player_max_health;
        snap.enemy_health = encounter.enemy_health;
        snap.enemy_max_health = encounter.enemy_max_health;
        snap.spell_length = encounter.spell_sequence.len() as u32;
        snap.player_progress = encounter.player_sequence.len() as u32;
        snap.need_input = encounter.accepts_input();
    }
    snap
}
