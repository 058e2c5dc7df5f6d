use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::input::NoteSource;
use crate::model::{Enemy, Note, Screen};
use crate::score::ScoreEntry;

/// Named parameters for a translation key.
pub type MessageParams = BTreeMap<String, String>;

pub fn params<const N: usize>(pairs: [(&str, String); N]) -> MessageParams {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Sound effects the audio layer knows how to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Success,
    Fail,
    Win,
    Lose,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Caster {
    Player,
    Enemy,
}

/// Command for the presentation or audio layer. Hosts apply these in order and
/// never answer back; user choices come back through the `Game` API.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Event {
    ShowScreen {
        screen: Screen,
    },
    RenderEnemy {
        id: &'static str,
        glyph: &'static str,
    },
    RenderHealth {
        player: i32,
        player_max: i32,
        enemy: i32,
        enemy_max: i32,
    },
    RenderMessage {
        key: &'static str,
        params: MessageParams,
    },
    RenderSpellOptions {
        enabled: bool,
        notes: Vec<Note>,
    },
    RenderScore {
        score: u32,
    },
    RenderResult {
        title_key: &'static str,
        message_key: &'static str,
        show_continue: bool,
        params: MessageParams,
    },
    RenderProgressMap {
        enemies: Vec<Enemy>,
        current_level: usize,
        defeated: BTreeSet<usize>,
        score: u32,
    },
    RenderLeaderboard {
        entries: Vec<ScoreEntry>,
    },
    MagicEffect {
        caster: Caster,
    },
    ShowContinue,
    ShowInscription {
        score: u32,
        level: usize,
    },
    NamePrompt {
        key: &'static str,
    },
    PlayTone {
        note: Note,
        duration: f32,
        source: Option<NoteSource>,
    },
    PlayEffect {
        effect: Effect,
    },
}

impl Event {
    pub fn message(key: &'static str) -> Self {
        Event::RenderMessage {
            key,
            params: MessageParams::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::ShowScreen { .. } => "ShowScreen",
            Event::RenderEnemy { .. } => "RenderEnemy",
            Event::RenderHealth { .. } => "RenderHealth",
            Event::RenderMessage { .. } => "RenderMessage",
            Event::RenderSpellOptions { .. } => "RenderSpellOptions",
            Event::RenderScore { .. } => "RenderScore",
            Event::RenderResult { .. } => "RenderResult",
            Event::RenderProgressMap { .. } => "RenderProgressMap",
            Event::RenderLeaderboard { .. } => "RenderLeaderboard",
            Event::MagicEffect { .. } => "MagicEffect",
            Event::ShowContinue => "ShowContinue",
            Event::ShowInscription { .. } => "ShowInscription",
            Event::NamePrompt { .. } => "NamePrompt",
            Event::PlayTone { .. } => "PlayTone",
            Event::PlayEffect { .. } => "PlayEffect",
        }
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|err| format!(r#"{{"kind":"{}","error":"{err}"}}"#, self.kind()))
    }
}
