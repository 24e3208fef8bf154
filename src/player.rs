use std::time::Duration;

use log::debug;

use crate::config::{PlayerConfig, TrackConfig};
use crate::data_model::DataModel;
use crate::scene::PLAYER;
use crate::status::Outcome;
use crate::tween::{Ease, Tween};

/// Position along the track and per-frame speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub position_x: f32,
    pub velocity: f32,
}

/// The sphere racing toward the finish line.
#[derive(Debug)]
pub struct Player {
    state: PlayerState,
    run_speed: f32,
    stop_ease: Duration,
    end_position: f32,
    braking: Option<Tween>,
    model: DataModel,
}

impl Player {
    pub fn new(track: &TrackConfig, config: &PlayerConfig, model: DataModel) -> Self {
        Self {
            state: PlayerState {
                position_x: track.start_position,
                velocity: 0.0,
            },
            run_speed: config.run_speed,
            stop_ease: Duration::from_millis(config.stop_ease_ms),
            end_position: track.end_position(),
            braking: None,
            model,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_braking(&self) -> bool {
        self.braking.is_some()
    }

    /// Jumps straight to running speed, abandoning any braking in progress.
    pub fn run(&mut self) {
        self.braking = None;
        self.state.velocity = self.run_speed;
    }

    /// Eases the velocity down to zero, starting from its value at `now`.
    pub fn stop(&mut self, now: Duration) {
        self.apply_braking(now);
        debug!("player braking from velocity {:.4}", self.state.velocity);
        self.braking = Some(Tween::new(
            self.state.velocity,
            0.0,
            now,
            self.stop_ease,
            Ease::Power1Out,
        ));
    }

    /// Evaluates the end conditions. Moving while watched is checked first and wins ties.
    pub fn check(&self, facing_away: bool) -> Option<Outcome> {
        if self.state.velocity > 0.0 && !facing_away {
            return Some(Outcome::Lose);
        }
        if self.state.position_x < self.end_position {
            return Some(Outcome::Win);
        }
        None
    }

    /// Per-frame step: check, integrate, then publish the new position.
    pub fn update(&mut self, now: Duration, facing_away: bool) -> Option<Outcome> {
        self.apply_braking(now);
        let outcome = self.check(facing_away);
        self.state.position_x -= self.state.velocity;
        self.model.set_position_x(PLAYER, self.state.position_x);
        outcome
    }

    fn apply_braking(&mut self, now: Duration) {
        let Some(tween) = self.braking else {
            return;
        };
        self.state.velocity = tween.sample(now).max(0.0);
        if tween.is_finished(now) {
            self.braking = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::scene::Stage;
    use crate::schedule::millis;

    fn player() -> (Player, DataModel) {
        let config = GameConfig::default();
        let model = DataModel::from_objects(Stage::build(&config).objects);
        (
            Player::new(&config.track, &config.player, model.clone()),
            model,
        )
    }

    #[test]
    fn run_is_instant() {
        let (mut player, _) = player();
        player.run();
        assert_eq!(player.state().velocity, 0.01);
    }

    #[test]
    fn stop_eases_to_zero_without_going_negative() {
        let (mut player, _) = player();
        player.run();
        player.stop(millis(1_000));
        player.update(millis(1_050), true);
        let mid = player.state().velocity;
        assert!(mid > 0.0 && mid < 0.01);
        player.update(millis(1_100), true);
        assert_eq!(player.state().velocity, 0.0);
        assert!(!player.is_braking());
        player.update(millis(1_500), true);
        assert_eq!(player.state().velocity, 0.0);
    }

    #[test]
    fn run_cancels_braking() {
        let (mut player, _) = player();
        player.run();
        player.stop(millis(0));
        player.run();
        player.update(millis(200), true);
        assert_eq!(player.state().velocity, 0.01);
    }

    #[test]
    fn update_integrates_and_publishes_position() {
        let (mut player, model) = player();
        player.run();
        assert_eq!(player.update(millis(0), true), None);
        let x = player.state().position_x;
        assert!((x - 0.59).abs() < 1e-6);
        assert_eq!(model.get(PLAYER).unwrap().position.x, x);
    }

    #[test]
    fn moving_while_watched_loses() {
        let (mut player, _) = player();
        player.run();
        assert_eq!(player.check(false), Some(Outcome::Lose));
        assert_eq!(player.check(true), None);
    }

    #[test]
    fn standing_still_while_watched_is_safe() {
        let (player, _) = player();
        assert_eq!(player.check(false), None);
    }

    #[test]
    fn losing_beats_winning_in_the_same_frame() {
        let (mut player, _) = player();
        player.state.position_x = -0.61;
        assert_eq!(player.check(true), Some(Outcome::Win));
        player.run();
        assert_eq!(player.check(false), Some(Outcome::Lose));
    }
}
