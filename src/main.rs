#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use red_light::{GameConfig, Strategy};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let mut config = match &options.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(model) = &options.model {
        config.model_path = model.clone();
    }
    config.validate().context("invalid configuration")?;

    if options.headless {
        return run_headless(&config, options.strategy, options.seed);
    }
    match interactive::run_interactive(&config, options.seed) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --headless mode (set DISPLAY or install X11 libs to enable rendering)."
            );
            run_headless(&config, options.strategy, options.seed)
        }
        Err(err) => Err(err),
    }
}

fn run_headless(config: &GameConfig, strategy: Strategy, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    println!("Headless session: strategy {strategy}, seed {seed}");
    let report = red_light::simulate(config, strategy, seed).context("headless session failed")?;
    for event in &report.events {
        if let red_light::GameEvent::Banner { at, banner } = event {
            println!("[{:>7.3}s] {banner}", at.as_secs_f64());
        }
    }
    match report.outcome {
        Some(outcome) => println!("Outcome: {outcome:?} after {} frame(s)", report.frames),
        None => println!("Outcome: undecided after {} frame(s)", report.frames),
    }
    red_light::print_final_state(&report.objects);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
mod interactive {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::info;
    use pollster::block_on;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use winit::dpi::LogicalSize;
    use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
    use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
    use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
    use winit::platform::run_on_demand::EventLoopExtRunOnDemand;
    use winit::window::WindowBuilder;

    use red_light::{
        draw, map_keycode, print_final_state, FrameClock, FrameLoop, Game, GameConfig, GameEvent,
        LoopState, ModelLoader, Renderer, Stage, DOLL_MESH, WINDOW_TITLE,
    };

    use super::{catch_init_panic, WindowInitError};

    pub fn run_interactive(config: &GameConfig, seed: Option<u64>) -> Result<()> {
        let event_loop = catch_init_panic("event loop", EventLoop::new)?
            .map_err(|err| WindowInitError::from_error("event loop", err))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(WINDOW_TITLE)
                .with_inner_size(LogicalSize::new(1280.0, 720.0))
                .build(&event_loop)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );

        let mut renderer = block_on(Renderer::new(Arc::clone(&window)))?;
        let stage = Stage::build(config);
        for (name, mesh) in &stage.meshes {
            renderer.upload_mesh(name, mesh);
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut game = Game::new(config, &stage, rng).context("failed to set up the game")?;
        let loader = ModelLoader::spawn(&config.model_path);
        let clock = FrameClock::start();
        game.boot(clock.now());

        let mut app = AppState {
            renderer,
            game,
            loader: Some(loader),
            frame_loop: FrameLoop::new(),
            clock,
            last_error: None,
        };

        let mut event_loop = event_loop;
        event_loop.run_on_demand(|event, elwt| {
            if let Err(err) = app.process_event(&event, elwt) {
                app.last_error = Some(err);
                elwt.exit();
            }
        })?;

        app.shutdown();

        if let Some(err) = app.last_error {
            return Err(err);
        }

        Ok(())
    }

    struct AppState {
        renderer: Renderer,
        game: Game,
        loader: Option<ModelLoader>,
        frame_loop: FrameLoop,
        clock: FrameClock,
        last_error: Option<anyhow::Error>,
    }

    impl AppState {
        fn process_event(
            &mut self,
            event: &Event<()>,
            elwt: &EventLoopWindowTarget<()>,
        ) -> Result<()> {
            match event {
                Event::WindowEvent { event, window_id }
                    if *window_id == self.renderer.window_id() =>
                {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(size) => self.renderer.resize(*size),
                        WindowEvent::ScaleFactorChanged { .. } => {
                            let size = self.renderer.window().inner_size();
                            self.renderer.resize(size);
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            self.handle_keyboard(event, elwt)
                        }
                        WindowEvent::RedrawRequested => self.redraw()?,
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    self.poll_model();
                    if self.frame_loop.state() == LoopState::Running {
                        elwt.set_control_flow(ControlFlow::Poll);
                        self.renderer.window().request_redraw();
                    } else {
                        elwt.set_control_flow(ControlFlow::Wait);
                    }
                }
                _ => {}
            }
            Ok(())
        }

        fn redraw(&mut self) -> Result<()> {
            let now = self.clock.now();
            let renderer = &mut self.renderer;
            self.frame_loop
                .step(&mut self.game, now, |objects| draw(renderer, objects))?;
            self.publish_events();
            Ok(())
        }

        fn poll_model(&mut self) {
            let Some(loader) = self.loader.as_mut() else {
                return;
            };
            let Some(result) = loader.poll() else {
                return;
            };
            self.loader = None;
            let now = self.clock.now();
            match result {
                Ok(mesh) => {
                    self.renderer.upload_mesh(DOLL_MESH, &mesh);
                    self.game.doll_model_ready(now);
                }
                Err(err) => {
                    self.game
                        .doll_model_failed(format!("{:#}", anyhow::Error::from(err)), now);
                }
            }
            self.publish_events();
        }

        fn handle_keyboard(&mut self, event: &KeyEvent, elwt: &EventLoopWindowTarget<()>) {
            if event.repeat {
                return;
            }
            if event.physical_key == PhysicalKey::Code(WinitKeyCode::Escape)
                && event.state == ElementState::Pressed
            {
                elwt.exit();
                return;
            }
            let Some(key) = map_keycode(&event.physical_key) else {
                return;
            };
            let now = self.clock.now();
            match event.state {
                ElementState::Pressed => self.game.press_key(key, now),
                ElementState::Released => self.game.release_key(key, now),
            }
        }

        fn publish_events(&mut self) {
            for event in self.game.drain_events() {
                if let GameEvent::Banner { banner, .. } = event {
                    self.renderer
                        .window()
                        .set_title(&format!("{WINDOW_TITLE} | {banner}"));
                }
            }
        }

        fn shutdown(&mut self) {
            info!(
                "closing after {} frame(s), outcome {:?}",
                self.frame_loop.frames(),
                self.game.outcome()
            );
            print_final_state(&self.game.objects());
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod interactive {
    use anyhow::{anyhow, Result};
    use red_light::GameConfig;

    pub fn run_interactive(_config: &GameConfig, _seed: Option<u64>) -> Result<()> {
        Err(anyhow!("the browser build starts through `red_light::run`"))
    }
}

struct CliOptions {
    config: Option<PathBuf>,
    model: Option<String>,
    headless: bool,
    strategy: Strategy,
    seed: Option<u64>,
}

const USAGE: &str = "Usage: red-light [--config <file>] [--model <file>] [--headless] [--strategy idle|hold|cautious] [--seed <n>]";

impl CliOptions {
    fn parse() -> Result<Self> {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            config: None,
            model: None,
            headless: false,
            strategy: Strategy::Hold,
            seed: None,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--config" => options.config = Some(PathBuf::from(value("--config")?)),
                "--model" => options.model = Some(value("--model")?),
                "--headless" => options.headless = true,
                "--strategy" => {
                    options.strategy = value("--strategy")?
                        .parse()
                        .map_err(|err: String| anyhow!("{err}"))?;
                }
                "--seed" => {
                    let raw = value("--seed")?;
                    options.seed = Some(
                        raw.parse()
                            .with_context(|| format!("--seed expects an integer, got {raw}"))?,
                    );
                }
                "--help" | "-h" => return Err(anyhow!(USAGE)),
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }
        Ok(options)
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

/// Runs a windowing call that may panic when no display is available.
fn catch_init_panic<T>(stage: &str, init: impl FnOnce() -> T) -> Result<T, WindowInitError> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(AssertUnwindSafe(init));
    panic::set_hook(default_hook);
    result.map_err(|panic| WindowInitError::from_panic(stage, panic))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}
