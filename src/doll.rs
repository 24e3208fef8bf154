//! The doll: turns away from and back toward the player on randomized timers.
//!
//! Turning is split in two: the visible yaw tween starts immediately, while the
//! `facing_away` flag that the lose check reads flips only after a lag. The lag
//! is shorter for turning away than for turning back, so the doll reacts a
//! little late in both directions.

use std::ops::Range;
use std::time::Duration;

use log::debug;
use rand::Rng;
use thiserror::Error;

use crate::config::DollConfig;
use crate::data_model::DataModel;
use crate::scene::DOLL;
use crate::schedule::{millis, Scheduler, TimerHandle};
use crate::tween::{Ease, Tween};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DollError {
    #[error("doll model has not finished loading")]
    NotReady,
    #[error("doll model failed to load: {0}")]
    LoadFailed(String),
}

/// Loading state of the doll's model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Pending,
    Ready,
    Failed(String),
}

/// Direction the doll is turning toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pose {
    FacingAway,
    FacingPlayer,
}

/// Timers the doll arms on the shared scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DollTimer {
    /// Update the `facing_away` flag after the reaction lag.
    Flag(bool),
    /// Next step of the alternation loop.
    Turn(Pose),
}

#[derive(Debug)]
pub struct Doll {
    config: DollConfig,
    model_state: ModelState,
    facing_away: bool,
    pose: Pose,
    yaw: Tween,
    pending: Vec<TimerHandle>,
    model: DataModel,
}

impl Doll {
    pub fn new(config: DollConfig, model: DataModel) -> Self {
        Self {
            config,
            model_state: ModelState::Pending,
            facing_away: true,
            pose: Pose::FacingPlayer,
            yaw: Tween::new(0.0, 0.0, Duration::ZERO, Duration::ZERO, Ease::Power1Out),
            pending: Vec::new(),
            model,
        }
    }

    pub fn model_state(&self) -> &ModelState {
        &self.model_state
    }

    pub fn is_ready(&self) -> bool {
        self.model_state == ModelState::Ready
    }

    /// Whether the lose check treats the doll as turned away.
    pub fn is_facing_away(&self) -> bool {
        self.facing_away
    }

    /// Pose of the latest turn command, ahead of the lagging flag.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn mark_ready(&mut self) {
        self.model_state = ModelState::Ready;
        self.model.set_visible(DOLL, true);
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.model_state = ModelState::Failed(reason.into());
    }

    /// Turns away from the player.
    pub fn look_back<T>(&mut self, now: Duration, timers: &mut Scheduler<T>) -> Result<(), DollError>
    where
        T: From<DollTimer>,
    {
        let delay = millis(self.config.look_back_flag_delay_ms);
        self.turn(now, Pose::FacingAway, self.config.look_back_yaw, delay, timers)
    }

    /// Turns to face the player.
    pub fn look_front<T>(&mut self, now: Duration, timers: &mut Scheduler<T>) -> Result<(), DollError>
    where
        T: From<DollTimer>,
    {
        let delay = millis(self.config.look_front_flag_delay_ms);
        self.turn(now, Pose::FacingPlayer, 0.0, delay, timers)
    }

    /// Starts the alternation loop with a look back.
    pub fn start<T, R>(
        &mut self,
        now: Duration,
        timers: &mut Scheduler<T>,
        rng: &mut R,
    ) -> Result<(), DollError>
    where
        T: From<DollTimer>,
        R: Rng + ?Sized,
    {
        self.step(now, Pose::FacingAway, timers, rng)
    }

    /// Handles a doll timer fired by the scheduler.
    pub fn on_timer<T, R>(
        &mut self,
        timer: DollTimer,
        now: Duration,
        timers: &mut Scheduler<T>,
        rng: &mut R,
    ) -> Result<(), DollError>
    where
        T: From<DollTimer>,
        R: Rng + ?Sized,
    {
        match timer {
            DollTimer::Flag(facing_away) => {
                debug!("doll counts as facing away: {facing_away}");
                self.facing_away = facing_away;
                Ok(())
            }
            DollTimer::Turn(pose) => self.step(now, pose, timers, rng),
        }
    }

    /// Cancels every timer the doll still has pending.
    pub fn halt<T>(&mut self, timers: &mut Scheduler<T>) {
        for handle in self.pending.drain(..) {
            timers.cancel(handle);
        }
    }

    /// Writes the yaw at `now` into the scene.
    pub fn sync(&self, now: Duration) {
        self.model.set_yaw(DOLL, self.yaw.sample(now));
    }

    fn step<T, R>(
        &mut self,
        now: Duration,
        pose: Pose,
        timers: &mut Scheduler<T>,
        rng: &mut R,
    ) -> Result<(), DollError>
    where
        T: From<DollTimer>,
        R: Rng + ?Sized,
    {
        let (hold, next) = match pose {
            Pose::FacingAway => {
                self.look_back(now, timers)?;
                (self.config.away_ms, Pose::FacingPlayer)
            }
            Pose::FacingPlayer => {
                self.look_front(now, timers)?;
                (self.config.toward_ms, Pose::FacingAway)
            }
        };
        let delay = random_delay(rng, hold[0] as f64..hold[1] as f64);
        let handle = timers.schedule_after(now, delay, DollTimer::Turn(next).into());
        self.pending.push(handle);
        Ok(())
    }

    fn turn<T>(
        &mut self,
        now: Duration,
        pose: Pose,
        yaw: f32,
        flag_delay: Duration,
        timers: &mut Scheduler<T>,
    ) -> Result<(), DollError>
    where
        T: From<DollTimer>,
    {
        match &self.model_state {
            ModelState::Ready => {}
            ModelState::Pending => return Err(DollError::NotReady),
            ModelState::Failed(reason) => return Err(DollError::LoadFailed(reason.clone())),
        }
        debug!("doll turning to {pose:?}");
        self.pending.retain(|handle| handle.due() >= now);
        self.pose = pose;
        self.yaw = Tween::new(
            self.yaw.sample(now),
            yaw,
            now,
            millis(self.config.turn_ms),
            Ease::Power1Out,
        );
        let facing_away = pose == Pose::FacingAway;
        let handle = timers.schedule_after(now, flag_delay, DollTimer::Flag(facing_away).into());
        self.pending.push(handle);
        Ok(())
    }
}

fn random_delay<R: Rng + ?Sized>(rng: &mut R, range_ms: Range<f64>) -> Duration {
    Duration::from_secs_f64(rng.gen_range(range_ms) / 1_000.0)
}
