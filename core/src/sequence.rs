use crate::model::{Difficulty, EncounterState, Enemy, Note, Outcome};
use crate::rng::GameRng;

/// Spell length against `enemy` at `difficulty`.
pub fn sequence_length(difficulty: Difficulty, enemy: &Enemy) -> usize {
    difficulty.profile().base_sequence_length + enemy.difficulty_tier as usize
}

/// Draws `length` notes uniformly and independently from `available`.
/// Repeats, consecutive or not, are allowed.
pub fn generate_sequence(rng: &mut GameRng, available: &[Note], length: usize) -> Vec<Note> {
    (0..length).filter_map(|_| rng.pick(available)).collect()
}

/// Feeds one player note into the encounter and classifies the result.
///
/// Input is only accepted while it is the player's turn and the fail latch is
/// clear. A note beyond the spell length is dropped.
pub fn append_player_note(encounter: &mut EncounterState, note: Note) -> Outcome {
    if !encounter.accepts_input() {
        return Outcome::Ignored;
    }

    encounter.player_sequence.push(note);
    let len = encounter.player_sequence.len();

    if len > encounter.spell_sequence.len() {
        encounter.player_sequence.pop();
        return Outcome::Pending;
    }

    let idx = len - 1;
    if encounter.player_sequence[idx] != encounter.spell_sequence[idx] {
        encounter.has_failed = true;
        return Outcome::Fail;
    }

    if len == encounter.spell_sequence.len() {
        Outcome::Success
    } else {
        Outcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemies::ENEMIES;

    fn encounter_with_spell(spell: &[Note]) -> EncounterState {
        let mut encounter = EncounterState::new(0, ENEMIES[0], 100, 100);
        encounter.spell_sequence = spell.to_vec();
        encounter.is_player_turn = true;
        encounter
    }

    #[test]
    fn length_adds_enemy_tier_to_difficulty_base() {
        assert_eq!(sequence_length(Difficulty::Novice, &ENEMIES[0]), 3);
        assert_eq!(sequence_length(Difficulty::Master, &ENEMIES[3]), 7);
    }

    #[test]
    fn generated_notes_come_from_pool() {
        let mut rng = GameRng::new(5);
        let pool = [Note::Mi, Note::Sol];
        let spell = generate_sequence(&mut rng, &pool, 40);
        assert_eq!(spell.len(), 40);
        assert!(spell.iter().all(|n| pool.contains(n)));
        assert!(generate_sequence(&mut rng, &[], 4).is_empty());
    }

    #[test]
    fn correct_notes_are_pending_then_success() {
        let mut enc = encounter_with_spell(&[Note::Do, Note::Re, Note::Do]);
        assert_eq!(append_player_note(&mut enc, Note::Do), Outcome::Pending);
        assert_eq!(append_player_note(&mut enc, Note::Re), Outcome::Pending);
        assert_eq!(append_player_note(&mut enc, Note::Do), Outcome::Success);
        assert!(!enc.has_failed);
    }

    #[test]
    fn mismatch_latches_failure_once() {
        let mut enc = encounter_with_spell(&[Note::Do, Note::Re, Note::Do]);
        assert_eq!(append_player_note(&mut enc, Note::Do), Outcome::Pending);
        assert_eq!(append_player_note(&mut enc, Note::Do), Outcome::Fail);
        assert!(enc.has_failed);

        assert_eq!(append_player_note(&mut enc, Note::Do), Outcome::Ignored);
        assert_eq!(append_player_note(&mut enc, Note::Re), Outcome::Ignored);
        assert_eq!(enc.player_sequence, vec![Note::Do, Note::Do]);
    }

    #[test]
    fn input_outside_player_turn_is_ignored() {
        let mut enc = encounter_with_spell(&[Note::Do]);
        enc.is_player_turn = false;
        assert_eq!(append_player_note(&mut enc, Note::Do), Outcome::Ignored);
        assert!(enc.player_sequence.is_empty());
    }

    #[test]
    fn overflow_note_is_dropped() {
        let mut enc = encounter_with_spell(&[Note::Re]);
        assert_eq!(append_player_note(&mut enc, Note::Re), Outcome::Success);
        assert_eq!(append_player_note(&mut enc, Note::Do), Outcome::Pending);
        assert_eq!(enc.player_sequence, vec![Note::Re]);
        assert!(!enc.has_failed);
    }
}
