#![cfg(target_arch = "wasm32")]

use std::sync::Arc;

use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::platform::web::{EventLoopExtWebSys, WindowBuilderExtWebSys};
use winit::window::WindowBuilder;

use crate::app::{draw, map_keycode, print_final_state, FrameClock, WINDOW_TITLE};
use crate::asset::load_model_from_slice;
use crate::config::GameConfig;
use crate::frame::{FrameLoop, LoopState};
use crate::game::{Game, GameEvent};
use crate::render::Renderer;
use crate::scene::{Stage, DOLL_MESH};

/// Starts the game on the canvas with id `canvas_id`.
///
/// `model_bytes` holds the doll's glTF/GLB file as fetched by the page; without
/// it the session ends with the load failure banner.
#[wasm_bindgen]
pub async fn run(canvas_id: String, model_bytes: Option<js_sys::Uint8Array>) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("missing document"))?;
    let canvas: web_sys::HtmlCanvasElement = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| JsValue::from_str("canvas element not found"))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("element is not a canvas"))?;
    let banner = document.query_selector(".text")?;
    if banner.is_none() {
        info!("no .text element on the page; banners go to the console only");
    }

    let event_loop = EventLoop::new()
        .map_err(|err| JsValue::from_str(&format!("failed to create event loop: {err}")))?;
    let width = canvas.client_width().max(1) as f64;
    let height = canvas.client_height().max(1) as f64;
    let window = Arc::new(
        WindowBuilder::new()
            .with_canvas(Some(canvas))
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(width, height))
            .build(&event_loop)
            .map_err(|err| JsValue::from_str(&format!("window error: {err}")))?,
    );

    let mut renderer = Renderer::new(Arc::clone(&window))
        .await
        .map_err(|err| JsValue::from_str(&format!("renderer error: {err:#}")))?;

    let config = GameConfig::default();
    let stage = Stage::build(&config);
    for (name, mesh) in &stage.meshes {
        renderer.upload_mesh(name, mesh);
    }
    let game = Game::new(&config, &stage, StdRng::from_entropy())
        .map_err(|err| JsValue::from_str(&format!("invalid configuration: {err}")))?;

    let mut app = WebAppState {
        renderer,
        game,
        frame_loop: FrameLoop::new(),
        clock: FrameClock::start(),
        banner,
    };
    app.game.boot(app.clock.now());
    app.load_model(model_bytes.map(|bytes| bytes.to_vec()));

    event_loop.spawn(move |event, elwt| {
        if let Err(err) = app.process_event(&event, elwt) {
            error!("{err:#}");
            elwt.exit();
        }
    });

    Ok(())
}

struct WebAppState {
    renderer: Renderer,
    game: Game,
    frame_loop: FrameLoop,
    clock: FrameClock,
    banner: Option<web_sys::Element>,
}

impl WebAppState {
    fn process_event(
        &mut self,
        event: &Event<()>,
        elwt: &EventLoopWindowTarget<()>,
    ) -> anyhow::Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => self.renderer.resize(*size),
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = self.renderer.window().inner_size();
                        self.renderer.resize(size);
                    }
                    WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard(event),
                    WindowEvent::RedrawRequested => self.redraw()?,
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if self.frame_loop.state() == LoopState::Running {
                    elwt.set_control_flow(ControlFlow::Poll);
                    self.renderer.window().request_redraw();
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            Event::LoopExiting => print_final_state(&self.game.objects()),
            _ => {}
        }
        Ok(())
    }

    fn load_model(&mut self, bytes: Option<Vec<u8>>) {
        let now = self.clock.now();
        let result = match bytes {
            Some(bytes) => load_model_from_slice(&bytes).map_err(anyhow::Error::from),
            None => Err(anyhow::anyhow!("no model bytes were supplied")),
        };
        match result {
            Ok(mesh) => {
                self.renderer.upload_mesh(DOLL_MESH, &mesh);
                self.game.doll_model_ready(now);
            }
            Err(err) => self.game.doll_model_failed(format!("{err:#}"), now),
        }
        self.publish_events();
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let now = self.clock.now();
        let renderer = &mut self.renderer;
        self.frame_loop
            .step(&mut self.game, now, |objects| draw(renderer, objects))?;
        self.publish_events();
        Ok(())
    }

    fn handle_keyboard(&mut self, event: &KeyEvent) {
        if event.repeat {
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
                if let Some(element) = &self.banner {
                    element.set_text_content(Some(&banner.to_string()));
                }
            }
        }
    }
}
