//! Tunable game parameters.
//!
//! Every field has a default matching the classic game feel, so an empty (or
//! missing) TOML file yields a playable configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::KeyCode;
use crate::schedule::millis;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration syntax")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Path of the doll model, relative to the working directory.
    pub model_path: String,
    pub track: TrackConfig,
    pub player: PlayerConfig,
    pub doll: DollConfig,
    pub timing: TimingConfig,
    pub input: InputConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            model_path: "models/scene.gltf".to_string(),
            track: TrackConfig::default(),
            player: PlayerConfig::default(),
            doll: DollConfig::default(),
            timing: TimingConfig::default(),
            input: InputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackConfig {
    /// The player starts at `+start_position`; the finish line sits at `-start_position`.
    pub start_position: f32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            start_position: 0.6,
        }
    }
}

impl TrackConfig {
    pub fn end_position(&self) -> f32 {
        -self.start_position
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Distance covered per frame while running.
    pub run_speed: f32,
    pub stop_ease_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            run_speed: 0.01,
            stop_ease_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DollConfig {
    pub turn_ms: u64,
    /// Yaw (radians) of the turned-away pose.
    pub look_back_yaw: f32,
    /// Lag between the look-back command and the doll counting as turned away.
    pub look_back_flag_delay_ms: u64,
    /// Lag between the look-front command and the doll counting as watching.
    pub look_front_flag_delay_ms: u64,
    /// Half-open `[min, max)` range the doll stays turned away for.
    pub away_ms: [u64; 2],
    /// Half-open `[min, max)` range the doll stays facing the player for.
    pub toward_ms: [u64; 2],
}

impl Default for DollConfig {
    fn default() -> Self {
        Self {
            turn_ms: 500,
            look_back_yaw: -3.15,
            look_back_flag_delay_ms: 200,
            look_front_flag_delay_ms: 500,
            away_ms: [1_000, 2_000],
            toward_ms: [750, 1_500],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Delays before each countdown banner; the last one precedes "Go!".
    pub countdown_ms: Vec<u64>,
    pub time_limit_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            countdown_ms: vec![1_000, 1_000, 1_000, 500],
            time_limit_ms: 10_000,
        }
    }
}

impl TimingConfig {
    pub fn time_limit(&self) -> Duration {
        millis(self.time_limit_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub advance_key: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            advance_key: "ArrowLeft".to_string(),
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.track.start_position > 0.0) {
            return Err(invalid("track.start_position must be positive"));
        }
        if !(self.player.run_speed > 0.0) {
            return Err(invalid("player.run_speed must be positive"));
        }
        if self.timing.time_limit_ms == 0 {
            return Err(invalid("timing.time_limit_ms must be positive"));
        }
        if self.timing.countdown_ms.is_empty() {
            return Err(invalid("timing.countdown_ms needs at least one step"));
        }
        if self.timing.countdown_ms.len() > usize::from(u8::MAX) {
            return Err(invalid("timing.countdown_ms has too many steps"));
        }
        check_range("doll.away_ms", self.doll.away_ms)?;
        check_range("doll.toward_ms", self.doll.toward_ms)?;
        self.advance_key()?;
        Ok(())
    }

    pub fn advance_key(&self) -> Result<KeyCode, ConfigError> {
        KeyCode::from_name(&self.input.advance_key).ok_or_else(|| {
            invalid(format!("unknown advance key {:?}", self.input.advance_key))
        })
    }
}

fn check_range(name: &str, [min, max]: [u64; 2]) -> Result<(), ConfigError> {
    if min >= max {
        return Err(invalid(format!("{name} must be an increasing [min, max) pair")));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
