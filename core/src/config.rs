//! Game configuration.
//!
//! Every field has a default matching the shipped game, so a host can pass an
//! empty string (or a partial TOML document) and only override what it needs:
//!
//! ```toml
//! player_max_health = 120
//!
//! [timings]
//! note_interval = 600
//!
//! [developer_mode]
//! enabled = true
//! ```

use serde::Deserialize;

use crate::error::Result;
use crate::model::Difficulty;

pub const GAME_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_max_health: i32,
    pub default_difficulty: Difficulty,
    pub play_reference_note: bool,
    pub timings: Timings,
    pub developer_mode: DeveloperMode,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_max_health: 100,
            default_difficulty: Difficulty::Novice,
            play_reference_note: true,
            timings: Timings::default(),
            developer_mode: DeveloperMode::default(),
        }
    }
}

impl GameConfig {
    /// Parses a TOML document. Blank input yields the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(text)?)
    }
}

/// Delays between state-machine stages, in milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub setup_to_reference: u64,
    pub setup_to_cast: u64,
    pub reference_tone_delay: u64,
    pub reference_to_cast: u64,
    pub cast_to_playback: u64,
    pub note_interval: u64,
    pub playback_to_player: u64,
    pub input_to_resolution: u64,
    pub resolution_pause: u64,
    pub inscription_return: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            setup_to_reference: 1000,
            setup_to_cast: 1500,
            reference_tone_delay: 1000,
            reference_to_cast: 1500,
            cast_to_playback: 1000,
            note_interval: 800,
            playback_to_player: 500,
            input_to_resolution: 500,
            resolution_pause: 1500,
            inscription_return: 500,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeveloperMode {
    /// Allows the toggle key to switch developer mode on during a run.
    pub enabled: bool,
    pub toggle_key: String,
    pub auto_complete_key: String,
}

impl Default for DeveloperMode {
    fn default() -> Self {
        Self {
            enabled: false,
            toggle_key: "F2".to_string(),
            auto_complete_key: "x".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_text_gives_defaults() {
        assert_eq!(GameConfig::from_toml_str("  \n").unwrap(), GameConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config = GameConfig::from_toml_str(
            r#"
            default_difficulty = "adept"

            [timings]
            note_interval = 600

            [developer_mode]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.default_difficulty, Difficulty::Adept);
        assert_eq!(config.timings.note_interval, 600);
        assert_eq!(config.timings.resolution_pause, 1500);
        assert!(config.developer_mode.enabled);
        assert_eq!(config.developer_mode.toggle_key, "F2");
        assert_eq!(config.player_max_health, 100);
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = GameConfig::from_toml_str("player_max_health = \"lots\"").unwrap_err();
        assert!(matches!(err, crate::error::GameError::Config(_)));
    }
}
