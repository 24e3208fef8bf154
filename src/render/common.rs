use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::mesh::FLOATS_PER_VERTEX;
use crate::scene::SceneObject;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Ambient light applied uniformly to every unlit surface.
#[derive(Clone, Debug)]
pub struct LightParams {
    pub color: Vec3,
    pub intensity: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
}

impl GlobalUniform {
    pub fn new(camera: &CameraParams, light: &LightParams) -> Self {
        Self {
            view_proj: camera.view_proj.to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
            ambient: light.color.extend(light.intensity).into(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ObjectConstants {
    pub fn new(object: &SceneObject) -> Self {
        Self {
            model: object_model_matrix(object).to_cols_array_2d(),
            color: object.color.extend(1.0).into(),
        }
    }
}

/// Translation, then X/Y/Z rotation, then scale.
pub fn object_model_matrix(object: &SceneObject) -> Mat4 {
    let translation = Mat4::from_translation(object.position);
    let rotation = Mat4::from_rotation_z(object.rotation.z)
        * Mat4::from_rotation_y(object.rotation.y)
        * Mat4::from_rotation_x(object.rotation.x);
    let scale = Mat4::from_scale(object.scale);
    translation * rotation * scale
}

pub(crate) const VERTEX_STRIDE: u64 = (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u64;

pub(crate) const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = globals.view_proj * object.model * vec4<f32>(input.position, 1.0);
    out.color = input.color * object.color.rgb;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let ambient = globals.ambient.rgb * globals.ambient.w;
    return vec4<f32>(input.color * ambient, object.color.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_matrix_scales_before_rotating() {
        let object = SceneObject {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vec3::new(2.0, 1.0, 1.0),
            ..SceneObject::default()
        };
        let moved = object_model_matrix(&object).transform_point3(Vec3::X);
        assert!(moved.abs_diff_eq(Vec3::new(1.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 96);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 80);
        assert_eq!(VERTEX_STRIDE, 36);
    }
}
