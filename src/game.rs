//! Composition root: one session of the game on a cooperative timeline.
//!
//! Hosts drive a [`Game`] with three kinds of calls, all stamped with the
//! session clock: [`Game::advance`] to fire due timers, key presses and
//! releases, and the per-frame [`Game::sync_visuals`] / [`Game::update_player`]
//! pair (normally through [`crate::frame::FrameLoop`]).

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use log::{error, info, warn};
use rand::rngs::StdRng;

use crate::config::{ConfigError, GameConfig};
use crate::countdown::{Countdown, CountdownTick, CountdownTimer};
use crate::data_model::DataModel;
use crate::doll::{Doll, DollTimer, ModelState};
use crate::input::{InputBridge, InputState, KeyCode, PlayerCommand};
use crate::player::{Player, PlayerState};
use crate::scene::{SceneObject, Stage, PROGRESS_BAR};
use crate::schedule::Scheduler;
use crate::status::{Banner, GameState, GameStatus, Outcome};
use crate::tween::{Ease, Tween};

/// Every timer armed during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Countdown(CountdownTimer),
    Doll(DollTimer),
    Timeout,
}

impl From<CountdownTimer> for TimerEvent {
    fn from(timer: CountdownTimer) -> Self {
        TimerEvent::Countdown(timer)
    }
}

impl From<DollTimer> for TimerEvent {
    fn from(timer: DollTimer) -> Self {
        TimerEvent::Doll(timer)
    }
}

/// Observable changes, queued for hosts to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Banner { at: Duration, banner: Banner },
    Status { at: Duration, status: GameStatus },
}

pub struct Game {
    state: GameState,
    player: Player,
    doll: Doll,
    countdown: Countdown,
    timers: Scheduler<TimerEvent>,
    time_limit: Duration,
    progress: Option<Tween>,
    input: InputBridge,
    model: DataModel,
    rng: StdRng,
    banner: Option<Banner>,
    events: Vec<GameEvent>,
    awaiting_model: bool,
    booted: bool,
}

impl Game {
    pub fn new(config: &GameConfig, stage: &Stage, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let model = DataModel::from_objects(stage.objects.clone());
        let input = InputBridge::new(config.advance_key()?, Arc::new(InputState::new()));
        Ok(Self {
            state: GameState::new(),
            player: Player::new(&config.track, &config.player, model.clone()),
            doll: Doll::new(config.doll.clone(), model.clone()),
            countdown: Countdown::from_delays(&config.timing.countdown_ms),
            timers: Scheduler::new(),
            time_limit: config.timing.time_limit(),
            progress: None,
            input,
            model,
            rng,
            banner: None,
            events: Vec::new(),
            awaiting_model: false,
            booted: false,
        })
    }

    /// Kicks off the countdown. Later calls are ignored.
    pub fn boot(&mut self, now: Duration) {
        if self.booted {
            return;
        }
        self.booted = true;
        info!("countdown armed, game starts in {:?}", self.countdown.total());
        self.countdown.schedule(now, &mut self.timers);
    }

    /// Fires every timer due at or before `now`, in order.
    pub fn advance(&mut self, now: Duration) {
        while let Some((due, event)) = self.timers.pop_due(now) {
            self.fire(due, event);
        }
    }

    pub fn press_key(&mut self, key: KeyCode, now: Duration) {
        let command = self.input.press(key, self.state.status());
        self.apply(command, now);
    }

    pub fn release_key(&mut self, key: KeyCode, now: Duration) {
        let command = self.input.release(key, self.state.status());
        self.apply(command, now);
    }

    /// The doll's model finished loading.
    pub fn doll_model_ready(&mut self, now: Duration) {
        if self.state.is_over() {
            return;
        }
        info!("doll model ready");
        self.doll.mark_ready();
        if self.awaiting_model {
            self.awaiting_model = false;
            self.start(now);
        }
    }

    /// The doll's model could not be loaded; the session ends with a fault.
    pub fn doll_model_failed(&mut self, reason: impl Into<String>, now: Duration) {
        let reason = reason.into();
        error!("doll model failed to load: {reason}");
        self.doll.mark_failed(reason);
        self.finish(now, Outcome::Fault);
    }

    /// Pushes animated transforms (doll yaw, progress bar) into the scene.
    pub fn sync_visuals(&mut self, now: Duration) {
        self.doll.sync(now);
        if let Some(progress) = self.progress {
            let scale = Vec3::new(progress.sample(now), 1.0, 1.0);
            self.model.set_scale(PROGRESS_BAR, scale);
        }
    }

    /// Per-frame player step; ends the session on a win or a loss.
    pub fn update_player(&mut self, now: Duration) {
        if self.state.is_over() {
            return;
        }
        if let Some(outcome) = self.player.update(now, self.doll.is_facing_away()) {
            self.finish(now, outcome);
        }
    }

    pub fn status(&self) -> GameStatus {
        self.state.status()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.outcome()
    }

    pub fn banner(&self) -> Option<Banner> {
        self.banner
    }

    pub fn player(&self) -> PlayerState {
        self.player.state()
    }

    pub fn doll(&self) -> &Doll {
        &self.doll
    }

    pub fn advance_key(&self) -> KeyCode {
        self.input.advance_key()
    }

    pub fn input_state(&self) -> &Arc<InputState> {
        self.input.input_state()
    }

    pub fn model(&self) -> &DataModel {
        &self.model
    }

    pub fn objects(&self) -> Vec<SceneObject> {
        self.model.snapshot()
    }

    /// Number of timers still armed.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Takes the events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn apply(&mut self, command: Option<PlayerCommand>, now: Duration) {
        match command {
            Some(PlayerCommand::Run) => self.player.run(),
            Some(PlayerCommand::Stop) => self.player.stop(now),
            None => {}
        }
    }

    fn fire(&mut self, due: Duration, event: TimerEvent) {
        match event {
            TimerEvent::Countdown(timer) => match self.countdown.tick(timer) {
                Some(CountdownTick::Show(banner)) => self.show(due, banner),
                Some(CountdownTick::Go) => {
                    self.show(due, Banner::Go);
                    self.start(due);
                }
                None => warn!("unknown countdown step {}", timer.0),
            },
            TimerEvent::Doll(timer) => {
                if let Err(err) = self.doll.on_timer(timer, due, &mut self.timers, &mut self.rng) {
                    warn!("doll timer {timer:?} ignored: {err}");
                }
            }
            TimerEvent::Timeout => {
                if !self.state.is_over() {
                    self.finish(due, Outcome::Timeout);
                }
            }
        }
    }

    fn start(&mut self, now: Duration) {
        match self.doll.model_state().clone() {
            ModelState::Ready => {}
            ModelState::Pending => {
                info!("countdown finished before the doll model; holding the start");
                self.awaiting_model = true;
                return;
            }
            ModelState::Failed(_) => {
                self.finish(now, Outcome::Fault);
                return;
            }
        }
        if let Err(err) = self.state.start() {
            warn!("cannot start: {err}");
            return;
        }
        info!("game started");
        self.events.push(GameEvent::Status {
            at: now,
            status: GameStatus::Started,
        });
        self.model.set_visible(PROGRESS_BAR, true);
        self.progress = Some(Tween::new(1.0, 0.0, now, self.time_limit, Ease::Linear));
        if let Err(err) = self.doll.start(now, &mut self.timers, &mut self.rng) {
            warn!("doll loop did not start: {err}");
        }
        self.timers
            .schedule_after(now, self.time_limit, TimerEvent::Timeout);

        // A key held through the countdown counts as pressed at the start.
        if self.input.input_state().is_key_down(self.input.advance_key()) {
            info!("advance key already held at the start");
            self.player.run();
        }
    }

    fn finish(&mut self, now: Duration, outcome: Outcome) {
        if self.state.finish(outcome).is_err() {
            return;
        }
        self.doll.halt(&mut self.timers);
        let dropped = self.timers.cancel_all();
        info!("game over: {outcome:?} ({dropped} timer(s) cancelled)");
        self.events.push(GameEvent::Status {
            at: now,
            status: GameStatus::Over,
        });
        self.show(now, outcome.banner());
    }

    fn show(&mut self, at: Duration, banner: Banner) {
        info!("{banner}");
        self.banner = Some(banner);
        self.events.push(GameEvent::Banner { at, banner });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NamedKey;
    use crate::schedule::millis;
    use rand::SeedableRng;

    const LEFT: KeyCode = KeyCode::Named(NamedKey::Left);

    fn game() -> Game {
        let config = GameConfig::default();
        let stage = Stage::build(&config);
        Game::new(&config, &stage, StdRng::seed_from_u64(3)).unwrap()
    }

    fn banners(events: &[GameEvent]) -> Vec<(Duration, String)> {
        events
            .iter()
            .filter_map(|event| match event {
                GameEvent::Banner { at, banner } => Some((*at, banner.to_string())),
                GameEvent::Status { .. } => None,
            })
            .collect()
    }

    #[test]
    fn countdown_then_start() {
        let mut game = game();
        game.doll_model_ready(millis(0));
        game.boot(millis(0));
        game.advance(millis(3_499));
        assert_eq!(game.status(), GameStatus::Loading);
        game.advance(millis(3_500));
        assert_eq!(game.status(), GameStatus::Started);
        assert_eq!(
            banners(&game.drain_events()),
            vec![
                (millis(1_000), "Starting in 3".to_string()),
                (millis(2_000), "Starting in 2".to_string()),
                (millis(3_000), "Starting in 1".to_string()),
                (millis(3_500), "Go!".to_string()),
            ]
        );
        assert!(game.model().get(PROGRESS_BAR).unwrap().visible);
    }

    #[test]
    fn keys_before_start_are_ignored() {
        let mut game = game();
        game.doll_model_ready(millis(0));
        game.boot(millis(0));
        game.press_key(LEFT, millis(100));
        assert_eq!(game.player().velocity, 0.0);
        assert!(game.input_state().is_key_down(LEFT));
    }

    #[test]
    fn start_waits_for_the_doll_model() {
        let mut game = game();
        game.boot(millis(0));
        game.advance(millis(5_000));
        assert_eq!(game.status(), GameStatus::Loading);
        assert_eq!(game.banner(), Some(Banner::Go));
        game.doll_model_ready(millis(5_200));
        assert_eq!(game.status(), GameStatus::Started);
        game.advance(millis(15_199));
        assert_eq!(game.status(), GameStatus::Started);
        game.advance(millis(15_200));
        assert_eq!(game.outcome(), Some(Outcome::Timeout));
    }

    #[test]
    fn model_failure_ends_the_session() {
        let mut game = game();
        game.boot(millis(0));
        game.doll_model_failed("file not found", millis(400));
        assert_eq!(game.status(), GameStatus::Over);
        assert_eq!(game.outcome(), Some(Outcome::Fault));
        assert_eq!(game.banner(), Some(Banner::LoadFailed));
        assert_eq!(game.pending_timers(), 0);
    }

    #[test]
    fn progress_bar_shrinks_linearly() {
        let mut game = game();
        game.doll_model_ready(millis(0));
        game.boot(millis(0));
        game.advance(millis(3_500));
        game.sync_visuals(millis(8_500));
        let scale = game.model().get(PROGRESS_BAR).unwrap().scale;
        assert!((scale.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn game_over_cancels_all_timers() {
        let mut game = game();
        game.doll_model_ready(millis(0));
        game.boot(millis(0));
        game.advance(millis(13_500));
        assert_eq!(game.outcome(), Some(Outcome::Timeout));
        assert_eq!(game.pending_timers(), 0);
        assert_eq!(game.banner(), Some(Banner::Timeout));
    }
}
