//! Pieces shared by the native and web hosts.

use std::time::Duration;

use anyhow::{anyhow, Result};
use glam::{Mat4, Vec3};
use log::{info, warn};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::input::{KeyCode, NamedKey};
use crate::render::{CameraParams, LightParams, Renderer};
use crate::scene::SceneObject;

const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const CAMERA_FOV_DEGREES: f32 = 75.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;

pub const WINDOW_TITLE: &str = "Red Light, Green Light";

/// Fixed camera looking down -Z at the track.
pub fn camera_params(aspect: f32) -> CameraParams {
    let view = Mat4::look_at_rh(CAMERA_POSITION, CAMERA_POSITION - Vec3::Z, Vec3::Y);
    let projection = Mat4::perspective_rh(
        CAMERA_FOV_DEGREES.to_radians(),
        aspect.max(0.01),
        CAMERA_NEAR,
        CAMERA_FAR,
    );
    CameraParams {
        view_proj: projection * view,
        position: CAMERA_POSITION,
    }
}

/// White ambient light at full intensity.
pub fn ambient_light() -> LightParams {
    LightParams {
        color: Vec3::ONE,
        intensity: 1.0,
    }
}

/// Draws one frame, recovering from a lost or outdated surface.
pub fn draw(renderer: &mut Renderer, objects: &[SceneObject]) -> Result<()> {
    renderer.update_globals(&camera_params(renderer.aspect()), &ambient_light());
    match renderer.render(objects) {
        Ok(()) => Ok(()),
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            let size = renderer.window().inner_size();
            renderer.resize(size);
            Ok(())
        }
        Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
        Err(err) => {
            warn!("surface error ({err}); retrying next frame");
            Ok(())
        }
    }
}

pub fn map_keycode(key: &PhysicalKey) -> Option<KeyCode> {
    use KeyCode::{Character, Digit, Named};
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    Some(match code {
        WinitKeyCode::ArrowLeft => Named(NamedKey::Left),
        WinitKeyCode::ArrowRight => Named(NamedKey::Right),
        WinitKeyCode::ArrowUp => Named(NamedKey::Up),
        WinitKeyCode::ArrowDown => Named(NamedKey::Down),
        WinitKeyCode::Space => Named(NamedKey::Space),
        WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => Named(NamedKey::Enter),
        WinitKeyCode::Escape => Named(NamedKey::Escape),
        WinitKeyCode::KeyA => Character('A'),
        WinitKeyCode::KeyB => Character('B'),
        WinitKeyCode::KeyC => Character('C'),
        WinitKeyCode::KeyD => Character('D'),
        WinitKeyCode::KeyE => Character('E'),
        WinitKeyCode::KeyF => Character('F'),
        WinitKeyCode::KeyG => Character('G'),
        WinitKeyCode::KeyH => Character('H'),
        WinitKeyCode::KeyI => Character('I'),
        WinitKeyCode::KeyJ => Character('J'),
        WinitKeyCode::KeyK => Character('K'),
        WinitKeyCode::KeyL => Character('L'),
        WinitKeyCode::KeyM => Character('M'),
        WinitKeyCode::KeyN => Character('N'),
        WinitKeyCode::KeyO => Character('O'),
        WinitKeyCode::KeyP => Character('P'),
        WinitKeyCode::KeyQ => Character('Q'),
        WinitKeyCode::KeyR => Character('R'),
        WinitKeyCode::KeyS => Character('S'),
        WinitKeyCode::KeyT => Character('T'),
        WinitKeyCode::KeyU => Character('U'),
        WinitKeyCode::KeyV => Character('V'),
        WinitKeyCode::KeyW => Character('W'),
        WinitKeyCode::KeyX => Character('X'),
        WinitKeyCode::KeyY => Character('Y'),
        WinitKeyCode::KeyZ => Character('Z'),
        WinitKeyCode::Digit0 => Digit(0),
        WinitKeyCode::Digit1 => Digit(1),
        WinitKeyCode::Digit2 => Digit(2),
        WinitKeyCode::Digit3 => Digit(3),
        WinitKeyCode::Digit4 => Digit(4),
        WinitKeyCode::Digit5 => Digit(5),
        WinitKeyCode::Digit6 => Digit(6),
        WinitKeyCode::Digit7 => Digit(7),
        WinitKeyCode::Digit8 => Digit(8),
        WinitKeyCode::Digit9 => Digit(9),
        _ => return None,
    })
}

pub fn print_final_state(objects: &[SceneObject]) {
    println!("Final object states:");
    for object in objects {
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) yaw={:.2} scale.x={:.2}{}",
            object.name,
            object.position.x,
            object.position.y,
            object.position.z,
            object.rotation.y,
            object.scale.x,
            if object.visible { "" } else { " (hidden)" }
        );
    }
}

/// Session clock: time elapsed since the host booted the game.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl FrameClock {
    pub fn start() -> Self {
        info!("session clock started");
        Self {
            origin: std::time::Instant::now(),
        }
    }

    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Session clock backed by `performance.now()`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    origin_ms: f64,
}

#[cfg(target_arch = "wasm32")]
impl FrameClock {
    pub fn start() -> Self {
        info!("session clock started");
        Self {
            origin_ms: performance_now(),
        }
    }

    pub fn now(&self) -> Duration {
        Duration::from_secs_f64(((performance_now() - self.origin_ms) / 1_000.0).max(0.0))
    }
}

#[cfg(target_arch = "wasm32")]
fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_sees_the_track() {
        let camera = camera_params(16.0 / 9.0);
        let clip = camera.view_proj * Vec3::new(0.6, 0.0, 0.3).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn arrow_left_maps_to_the_advance_key() {
        let key = PhysicalKey::Code(WinitKeyCode::ArrowLeft);
        assert_eq!(map_keycode(&key), Some(KeyCode::Named(NamedKey::Left)));
        let key = PhysicalKey::Code(WinitKeyCode::F13);
        assert_eq!(map_keycode(&key), None);
    }

    #[test]
    fn clock_moves_forward() {
        let clock = FrameClock::start();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
