use std::convert::Infallible;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use red_light::scene::PLAYER;
use red_light::{
    simulate, Banner, FrameLoop, Game, GameConfig, GameEvent, GameStatus, KeyCode, LoopState,
    NamedKey, Outcome, SceneObject, Stage, Strategy,
};

const LEFT: KeyCode = KeyCode::Named(NamedKey::Left);
const FRAME: Duration = Duration::from_millis(16);

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn new_game(config: &GameConfig, seed: u64) -> Game {
    let stage = Stage::build(config);
    let mut game = Game::new(config, &stage, StdRng::seed_from_u64(seed)).expect("valid config");
    game.doll_model_ready(Duration::ZERO);
    game.boot(Duration::ZERO);
    game
}

/// Remembers the player's x position in every frame it was asked to draw.
#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<f32>,
}

impl RecordingRenderer {
    fn draw(&mut self, objects: &[SceneObject]) -> Result<(), Infallible> {
        let player = objects
            .iter()
            .find(|object| object.name == PLAYER)
            .expect("player object");
        self.frames.push(player.position.x);
        Ok(())
    }
}

fn step(
    frames: &mut FrameLoop,
    game: &mut Game,
    now: Duration,
    renderer: &mut RecordingRenderer,
) -> LoopState {
    frames
        .step(game, now, |objects| renderer.draw(objects))
        .unwrap_or_else(|never| match never {})
}

fn banners(events: &[GameEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            GameEvent::Banner { banner, .. } => Some(banner.to_string()),
            GameEvent::Status { .. } => None,
        })
        .collect()
}

#[test]
fn game_starts_exactly_after_the_countdown() {
    let mut game = new_game(&GameConfig::default(), 1);
    game.advance(ms(3_499));
    assert_eq!(game.status(), GameStatus::Loading);
    assert_eq!(game.banner(), Some(Banner::StartingIn(1)));
    game.advance(ms(3_500));
    assert_eq!(game.status(), GameStatus::Started);
    assert_eq!(
        banners(&game.drain_events()),
        ["Starting in 3", "Starting in 2", "Starting in 1", "Go!"]
    );
}

#[test]
fn each_frame_draws_before_moving_the_player() {
    let mut game = new_game(&GameConfig::default(), 2);
    let mut frames = FrameLoop::new();
    let mut renderer = RecordingRenderer::default();

    game.advance(ms(3_500));
    game.press_key(LEFT, ms(3_500));
    let mut positions_after = Vec::new();
    for i in 0..5 {
        let now = ms(3_500) + FRAME * i;
        assert_eq!(step(&mut frames, &mut game, now, &mut renderer), LoopState::Running);
        positions_after.push(game.player().position_x);
    }

    assert_eq!(renderer.frames[0], 0.6);
    for i in 1..5 {
        assert_eq!(renderer.frames[i], positions_after[i - 1]);
    }
    assert!(positions_after[4] < positions_after[0]);
}

#[test]
fn losing_wins_a_tie_with_crossing_the_line() {
    let mut config = GameConfig::default();
    config.player.run_speed = 1.3;
    let mut game = new_game(&config, 3);
    let mut frames = FrameLoop::new();
    let mut renderer = RecordingRenderer::default();

    game.advance(ms(3_500));
    game.press_key(LEFT, ms(3_500));
    step(&mut frames, &mut game, ms(3_500), &mut renderer);
    assert!(game.player().position_x < -0.6);
    assert_eq!(game.status(), GameStatus::Started);

    // Let the doll turn around without drawing a frame.
    let mut now = ms(3_500);
    while game.doll().is_facing_away() {
        now += FRAME;
        game.advance(now);
    }
    step(&mut frames, &mut game, now, &mut renderer);
    assert_eq!(game.outcome(), Some(Outcome::Lose));
    assert_eq!(game.banner(), Some(Banner::Lose));
}

#[test]
fn terminal_state_is_final() {
    let mut config = GameConfig::default();
    config.player.run_speed = 0.001;
    let mut game = new_game(&config, 4);
    let mut frames = FrameLoop::new();
    let mut renderer = RecordingRenderer::default();

    game.advance(ms(3_500));
    game.press_key(LEFT, ms(3_500));
    let mut now = ms(3_500);
    while step(&mut frames, &mut game, now, &mut renderer) == LoopState::Running {
        now += FRAME;
    }
    assert_eq!(game.outcome(), Some(Outcome::Lose));
    assert_eq!(game.pending_timers(), 0);

    let drawn = renderer.frames.len();
    let player = game.player();
    let yaw = game.model().get("doll").expect("doll").rotation.y;
    game.release_key(LEFT, now + ms(10));
    game.press_key(LEFT, now + ms(20));
    game.doll_model_ready(now + ms(30));
    game.advance(now + ms(60_000));
    for i in 1..10 {
        assert_eq!(
            step(&mut frames, &mut game, now + FRAME * i, &mut renderer),
            LoopState::Stopped
        );
    }
    assert_eq!(renderer.frames.len(), drawn);
    assert_eq!(game.player(), player);
    assert_eq!(game.model().get("doll").expect("doll").rotation.y, yaw);
    assert_eq!(game.outcome(), Some(Outcome::Lose));
    assert_eq!(game.status(), GameStatus::Over);
}

#[test]
fn release_before_the_start_is_harmless() {
    let mut game = new_game(&GameConfig::default(), 5);
    game.press_key(LEFT, ms(500));
    game.release_key(LEFT, ms(600));
    game.advance(ms(3_500));
    assert_eq!(game.status(), GameStatus::Started);
    assert_eq!(game.player().velocity, 0.0);
}

#[test]
fn idle_autopilot_times_out() {
    let report = simulate(&GameConfig::default(), Strategy::Idle, 6).expect("session");
    assert_eq!(report.outcome, Some(Outcome::Timeout));
    assert_eq!(
        banners(&report.events).last().map(String::as_str),
        Some("Timeout!")
    );
    let timeout_at = report.events.iter().find_map(|event| match event {
        GameEvent::Banner {
            at,
            banner: Banner::Timeout,
        } => Some(*at),
        _ => None,
    });
    assert_eq!(timeout_at, Some(ms(13_500)));
}

#[test]
fn cautious_autopilot_wins() {
    let report = simulate(&GameConfig::default(), Strategy::Cautious, 7).expect("session");
    assert_eq!(report.outcome, Some(Outcome::Win));
    assert_eq!(
        banners(&report.events).last().map(String::as_str),
        Some("You win!")
    );
}

#[test]
fn slow_runner_is_caught() {
    let mut config = GameConfig::default();
    config.player.run_speed = 0.001;
    let report = simulate(&config, Strategy::Hold, 8).expect("session");
    assert_eq!(report.outcome, Some(Outcome::Lose));
    assert_eq!(
        banners(&report.events).last().map(String::as_str),
        Some("You lose!")
    );
}

#[test]
fn missing_model_ends_with_the_fault_banner() {
    let config = GameConfig::default();
    let stage = Stage::build(&config);
    let mut game = Game::new(&config, &stage, StdRng::seed_from_u64(9)).expect("valid config");
    game.boot(Duration::ZERO);
    game.advance(ms(3_500));
    assert_eq!(game.status(), GameStatus::Loading);
    game.doll_model_failed("models/scene.gltf not found", ms(4_000));
    assert_eq!(game.outcome(), Some(Outcome::Fault));
    assert_eq!(
        game.banner().map(|banner| banner.to_string()).as_deref(),
        Some("Failed to load the doll model")
    );
}

#[test]
fn key_held_through_the_countdown_runs_at_go() {
    let mut game = new_game(&GameConfig::default(), 10);
    let mut frames = FrameLoop::new();
    let mut renderer = RecordingRenderer::default();

    game.press_key(LEFT, ms(3_000));
    game.advance(ms(3_499));
    assert_eq!(game.player().velocity, 0.0);

    let mut now = ms(3_500);
    for _ in 0..5 {
        step(&mut frames, &mut game, now, &mut renderer);
        now += FRAME;
    }
    assert_eq!(game.status(), GameStatus::Started);
    assert!(game.player().velocity > 0.0);
    assert!(game.player().position_x < 0.6);
}

#[test]
fn holding_the_key_the_whole_time_can_win() {
    let report = simulate(&GameConfig::default(), Strategy::Hold, 0).expect("session");
    assert_eq!(report.outcome, Some(Outcome::Win));
    assert_eq!(
        banners(&report.events).last().map(String::as_str),
        Some("You win!")
    );
    assert!(report.player.position_x < -0.6);
}
