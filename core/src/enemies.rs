use crate::model::Enemy;

/// Opponents in campaign order. Health and tier grow with each level.
pub static ENEMIES: [Enemy; 4] = [
    Enemy {
        id: "melodic_apprentice",
        base_health: 100,
        difficulty_tier: 1,
        glyph: "🧙‍♀️",
    },
    Enemy {
        id: "octave_sorcerer",
        base_health: 120,
        difficulty_tier: 2,
        glyph: "🧙‍♂️",
    },
    Enemy {
        id: "harmonic_mage",
        base_health: 150,
        difficulty_tier: 3,
        glyph: "🧝‍♀️",
    },
    Enemy {
        id: "symphonic_archmage",
        base_health: 200,
        difficulty_tier: 4,
        glyph: "🧙‍♂️",
    },
];
