use glam::Vec3;

use crate::config::GameConfig;
use crate::mesh::{cuboid, uv_sphere, MeshData};

pub const FLOOR: &str = "floor";
pub const START_MARKER: &str = "start-marker";
pub const END_MARKER: &str = "end-marker";
pub const PLAYER: &str = "player";
pub const DOLL: &str = "doll";
pub const PROGRESS_BAR: &str = "progress-bar";

/// Mesh key under which the loaded doll model is uploaded.
pub const DOLL_MESH: &str = "doll-model";

/// Background colour of the playfield (0xb7c3f3).
pub const CLEAR_COLOR: u32 = 0xb7c3f3;
const MARKER_COLOR: u32 = 0xfbc851;
const FLOOR_COLOR: u32 = 0xe5a716;
const PLAYER_COLOR: u32 = 0xffffff;

const DOLL_SCALE: f32 = 0.3;
const DOLL_POSITION: Vec3 = Vec3::new(0.0, 0.1, 0.0);
const PLAYER_RADIUS: f32 = 0.1;
const PLAYER_Z: f32 = 0.3;

/// Object placed in the playfield.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    /// Key of the mesh the renderer draws for this object.
    pub mesh: String,
    /// Linear RGB colour multiplied with the mesh's vertex colours.
    pub color: Vec3,
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub visible: bool,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            mesh: String::new(),
            color: Vec3::ONE,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            visible: true,
        }
    }
}

/// Objects and procedural meshes making up the playfield.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    pub objects: Vec<SceneObject>,
    pub meshes: Vec<(String, MeshData)>,
}

impl Stage {
    /// Builds the track, the player sphere, the doll slot and the progress bar.
    pub fn build(config: &GameConfig) -> Self {
        let start = config.track.start_position;
        let mut stage = Stage::default();

        stage.add_box(FLOOR, [start * 2.0, 0.3, 0.2], FLOOR_COLOR, |object| {
            object.position.z = -0.5;
        });
        stage.add_box(START_MARKER, [0.05, 0.3, 0.2], MARKER_COLOR, |object| {
            object.position = Vec3::new(start, 0.0, -0.3);
            object.rotation.y = -0.2;
        });
        stage.add_box(END_MARKER, [0.05, 0.3, 0.2], MARKER_COLOR, |object| {
            object.position = Vec3::new(-start, 0.0, -0.3);
            object.rotation.y = 0.2;
        });
        // Shown once the countdown hands over to the game.
        stage.add_box(PROGRESS_BAR, [0.5, 0.03, 0.2], MARKER_COLOR, |object| {
            object.position.y = 0.65;
            object.visible = false;
        });

        stage.meshes.push((
            PLAYER.to_string(),
            uv_sphere(PLAYER_RADIUS, 32, 16),
        ));
        stage.objects.push(SceneObject {
            name: PLAYER.to_string(),
            mesh: PLAYER.to_string(),
            color: hex_color(PLAYER_COLOR),
            position: Vec3::new(start, 0.0, PLAYER_Z),
            ..SceneObject::default()
        });

        // The doll mesh arrives asynchronously; the object stays hidden until then.
        stage.objects.push(SceneObject {
            name: DOLL.to_string(),
            mesh: DOLL_MESH.to_string(),
            position: DOLL_POSITION,
            scale: Vec3::splat(DOLL_SCALE),
            visible: false,
            ..SceneObject::default()
        });

        stage
    }

    fn add_box(
        &mut self,
        name: &str,
        [width, height, depth]: [f32; 3],
        color: u32,
        place: impl FnOnce(&mut SceneObject),
    ) {
        let mut object = SceneObject {
            name: name.to_string(),
            mesh: name.to_string(),
            color: hex_color(color),
            ..SceneObject::default()
        };
        place(&mut object);
        self.meshes
            .push((name.to_string(), cuboid(width, height, depth)));
        self.objects.push(object);
    }
}

/// Converts a `0xRRGGBB` sRGB colour to linear RGB.
pub fn hex_color(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

pub(crate) fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}
