//! Page configuration.
//!
//! Mount functions accept an optional JSON object; every key is optional and
//! falls back to the defaults below, so `{}` and no config at all are
//! equivalent.

use std::time::Duration;

use serde::Deserialize;

use crate::board::Level;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub game: GameConfig,
    pub form: FormConfig,
}

impl PageConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Blank or missing input yields the defaults.
    pub fn from_optional_json(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(raw) => Self::from_json(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// How long a mismatched pair stays face up.
    pub settle_delay_ms: u64,
    /// Elapsed counter period.
    pub tick_ms: u64,
    pub default_level: Level,
    pub ids: GameIds,
}

impl GameConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1_000,
            tick_ms: 1_000,
            default_level: Level::Easy,
            ids: GameIds::default(),
        }
    }
}

/// Element ids the game binds to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameIds {
    pub board: String,
    /// Container of the start buttons; each button carries `data-level`.
    pub controls: String,
    pub moves: String,
    pub matches: String,
    pub timer: String,
    pub win: String,
    pub best_easy: String,
    pub best_hard: String,
}

impl Default for GameIds {
    fn default() -> Self {
        Self {
            board: "gameBoard".into(),
            controls: "gameControls".into(),
            moves: "moves".into(),
            matches: "matches".into(),
            timer: "timer".into(),
            win: "winMessage".into(),
            best_easy: "bestEasy".into(),
            best_hard: "bestHard".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    /// Country code every phone number must start with.
    pub phone_prefix: String,
    /// Domestic trunk digit replaced by the country code (`8 612 34567`).
    pub trunk_prefix: String,
    /// Digits required after the country code.
    pub national_digits: usize,
    pub address_min_len: usize,
    /// How long the "sent" popup stays visible.
    pub popup_ms: u64,
    pub ids: FormIds,
}

impl FormConfig {
    pub fn popup_duration(&self) -> Duration {
        Duration::from_millis(self.popup_ms)
    }

    /// Total digits of a complete phone number.
    pub fn phone_len(&self) -> usize {
        self.phone_prefix.len() + self.national_digits
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            phone_prefix: "370".into(),
            trunk_prefix: "8".into(),
            national_digits: 8,
            address_min_len: 3,
            popup_ms: 2_500,
            ids: FormIds::default(),
        }
    }
}

/// Element ids of the form chrome. Field inputs use the ids from
/// [`crate::form::FieldId::dom_id`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormIds {
    pub form: String,
    pub submit: String,
    pub result: String,
    pub popup: String,
}

impl Default for FormIds {
    fn default() -> Self {
        Self {
            form: "contactForm".into(),
            submit: "submitBtn".into(),
            result: "formResult".into(),
            popup: "popupMessage".into(),
        }
    }
}
