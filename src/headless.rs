//! Windowless play on a simulated clock.
//!
//! An autopilot stands in for the keyboard, so a whole session can run in a
//! test or on a machine without a display.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ConfigError, GameConfig};
use crate::doll::Pose;
use crate::frame::{FrameLoop, LoopState};
use crate::game::{Game, GameEvent};
use crate::player::PlayerState;
use crate::scene::{SceneObject, Stage};
use crate::status::{GameStatus, Outcome};

/// Simulated frame length (60 Hz).
pub const FRAME: Duration = Duration::from_micros(16_667);

/// Extra simulated time allowed past the countdown and time limit.
const GRACE: Duration = Duration::from_secs(5);

/// How the autopilot handles the advance key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Never presses.
    Idle,
    /// Presses at the start and never lets go.
    Hold,
    /// Holds only while the doll is turned away and lets go as soon as it turns back.
    Cautious,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "idle" => Ok(Self::Idle),
            "hold" => Ok(Self::Hold),
            "cautious" => Ok(Self::Cautious),
            other => Err(format!(
                "unknown strategy {other}. Expected idle, hold or cautious"
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Hold => "hold",
            Self::Cautious => "cautious",
        })
    }
}

impl Strategy {
    fn wants_to_run(self, game: &Game) -> bool {
        if game.status() != GameStatus::Started {
            return false;
        }
        match self {
            Self::Idle => false,
            Self::Hold => true,
            Self::Cautious => {
                let doll = game.doll();
                doll.pose() == Pose::FacingAway && doll.is_facing_away()
            }
        }
    }
}

/// Everything a headless session produced.
#[derive(Debug, Clone)]
pub struct Report {
    pub events: Vec<GameEvent>,
    pub outcome: Option<Outcome>,
    pub player: PlayerState,
    pub objects: Vec<SceneObject>,
    pub frames: u64,
    pub elapsed: Duration,
}

/// Plays one session with the doll model treated as already loaded.
pub fn simulate(config: &GameConfig, strategy: Strategy, seed: u64) -> Result<Report, ConfigError> {
    let stage = Stage::build(config);
    let mut game = Game::new(config, &stage, StdRng::seed_from_u64(seed))?;
    let key = game.advance_key();
    let deadline = config
        .timing
        .countdown_ms
        .iter()
        .map(|ms| Duration::from_millis(*ms))
        .sum::<Duration>()
        + config.timing.time_limit()
        + GRACE;

    info!("headless session: strategy {strategy}, seed {seed}");
    let mut frame_loop = FrameLoop::new();
    let mut events = Vec::new();
    let mut holding = false;
    let mut now = Duration::ZERO;
    game.doll_model_ready(now);
    game.boot(now);

    loop {
        game.advance(now);
        let wants = strategy.wants_to_run(&game);
        if wants != holding {
            if wants {
                game.press_key(key, now);
            } else {
                game.release_key(key, now);
            }
            holding = wants;
        }

        let state = frame_loop
            .step(&mut game, now, |_| Ok::<(), Infallible>(()))
            .unwrap_or_else(|never| match never {});
        events.extend(game.drain_events());
        if state == LoopState::Stopped || now >= deadline {
            break;
        }
        now += FRAME;
    }

    Ok(Report {
        events,
        outcome: game.outcome(),
        player: game.player(),
        objects: game.objects(),
        frames: frame_loop.frames(),
        elapsed: now,
    })
}
