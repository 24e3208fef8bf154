mod common;
mod gpu;

pub use common::{object_model_matrix, CameraParams, LightParams};
pub use gpu::Renderer;
