//! "Red light, green light": a small 3D reflex game.
//!
//! A doll alternately turns away from and toward the player's sphere. Hold the
//! advance key while it looks away, let go before it looks back, and cross the
//! finish line before time runs out.
//!
//! The game logic ([`Game`], [`FrameLoop`] and the controllers behind them)
//! runs on an explicit clock and never touches a window, so the same session
//! can be driven by the desktop binary, the browser entry point or
//! [`simulate`] in tests.

pub mod app;
pub mod asset;
pub mod config;
pub mod countdown;
pub mod data_model;
pub mod doll;
pub mod frame;
pub mod game;
pub mod headless;
pub mod input;
pub mod mesh;
pub mod player;
pub mod render;
pub mod scene;
pub mod schedule;
pub mod status;
pub mod tween;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{
    ambient_light, camera_params, draw, map_keycode, print_final_state, FrameClock, WINDOW_TITLE,
};
#[cfg(not(target_arch = "wasm32"))]
pub use asset::ModelLoader;
pub use asset::{load_model, load_model_from_slice, AssetError};
pub use config::{ConfigError, GameConfig};
pub use data_model::DataModel;
pub use doll::{Doll, DollError, ModelState, Pose};
pub use frame::{FrameLoop, LoopState};
pub use game::{Game, GameEvent};
pub use headless::{simulate, Report, Strategy};
pub use input::{InputState, KeyCode, NamedKey};
pub use mesh::MeshData;
pub use player::{Player, PlayerState};
pub use render::{CameraParams, LightParams, Renderer};
pub use scene::{SceneObject, Stage, DOLL_MESH};
pub use schedule::Scheduler;
pub use status::{Banner, GameState, GameStatus, Outcome, TransitionError};
