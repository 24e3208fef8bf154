//! glTF loading for the doll model.
//!
//! Every triangle primitive reachable from the default scene is flattened into
//! one [`MeshData`], with node transforms baked into the vertices. The vertex
//! colour is the material's base colour factor, multiplied by the base colour
//! texture sampled (nearest texel) at the vertex's UV when the material has one.

use std::path::{Path, PathBuf};

use glam::{Mat3, Mat4, Vec3};
use gltf::mesh::util::ReadIndices;
use log::debug;
use thiserror::Error;

use crate::mesh::MeshData;
use crate::scene::srgb_to_linear;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to import glTF {}", path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("failed to parse glTF data")]
    Parse(#[source] gltf::Error),
    #[error("{0} contains no triangle geometry")]
    Empty(String),
    #[error("model loader stopped before reporting a result")]
    Disconnected,
}

/// Loads a `.gltf` or `.glb` file from disk.
pub fn load_model(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Import {
        path: path.to_path_buf(),
        source,
    })?;
    let sources = Sources {
        buffers: &buffers,
        images: &images,
    };
    flatten(&document, sources, &path.display().to_string())
}

/// Loads a model from in-memory glTF or GLB bytes.
pub fn load_model_from_slice(bytes: &[u8]) -> Result<MeshData, AssetError> {
    let (document, buffers, images) = gltf::import_slice(bytes).map_err(AssetError::Parse)?;
    let sources = Sources {
        buffers: &buffers,
        images: &images,
    };
    flatten(&document, sources, "embedded model")
}

/// Decoded buffer and image payloads of one glTF document.
#[derive(Clone, Copy)]
struct Sources<'a> {
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
}

fn flatten(document: &gltf::Document, sources: Sources, label: &str) -> Result<MeshData, AssetError> {
    let mut mesh = MeshData::default();
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                visit(&node, Mat4::IDENTITY, sources, &mut mesh);
            }
        }
        None => {
            // Scene-less files: take every mesh untransformed.
            for source in document.meshes() {
                append_mesh(&source, Mat4::IDENTITY, sources, &mut mesh);
            }
        }
    }
    if mesh.indices.is_empty() {
        return Err(AssetError::Empty(label.to_string()));
    }
    debug!(
        "{label}: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.indices.len() / 3
    );
    Ok(mesh)
}

fn visit(node: &gltf::Node, parent: Mat4, sources: Sources, out: &mut MeshData) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(source) = node.mesh() {
        append_mesh(&source, world, sources, out);
    }
    for child in node.children() {
        visit(&child, world, sources, out);
    }
}

fn append_mesh(source: &gltf::Mesh, transform: Mat4, sources: Sources, out: &mut MeshData) {
    let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
    for primitive in source.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }
        let reader = primitive
            .reader(|buffer| sources.buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None => vec![[0.0, 1.0, 0.0]; positions.len()],
        };
        let pbr = primitive.material().pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();
        let factor = Vec3::new(r, g, b);
        let texture = pbr.base_color_texture().and_then(|info| {
            let image = sources.images.get(info.texture().source().index())?;
            let uvs: Vec<[f32; 2]> = reader.read_tex_coords(info.tex_coord())?.into_f32().collect();
            Some((image, uvs))
        });

        let base = out.vertex_count() as u32;
        for (index, (position, normal)) in positions.iter().zip(normals.iter()).enumerate() {
            let position = transform.transform_point3(Vec3::from_array(*position));
            let normal = (normal_matrix * Vec3::from_array(*normal)).normalize_or_zero();
            let texel = texture
                .as_ref()
                .and_then(|(image, uvs)| sample_nearest(image, *uvs.get(index)?))
                .unwrap_or(Vec3::ONE);
            out.push_vertex(position, normal, factor * texel);
        }
        let indices: Vec<u32> = match reader.read_indices() {
            Some(ReadIndices::U8(it)) => it.map(u32::from).collect(),
            Some(ReadIndices::U16(it)) => it.map(u32::from).collect(),
            Some(ReadIndices::U32(it)) => it.collect(),
            None => (0..positions.len() as u32).collect(),
        };
        out.indices.extend(indices.into_iter().map(|index| base + index));
    }
}

/// Linear RGB of the texel under `uv`, wrapping like the default sampler.
/// `None` for pixel formats wider than 8 bits per channel.
fn sample_nearest(image: &gltf::image::Data, uv: [f32; 2]) -> Option<Vec3> {
    use gltf::image::Format;

    let channels = match image.format {
        Format::R8 => 1,
        Format::R8G8 => 2,
        Format::R8G8B8 => 3,
        Format::R8G8B8A8 => 4,
        _ => return None,
    };
    if image.width == 0 || image.height == 0 {
        return None;
    }
    let texel = |coord: f32, size: u32| {
        let wrapped = coord - coord.floor();
        ((wrapped * size as f32) as u32).min(size - 1) as usize
    };
    let x = texel(uv[0], image.width);
    let y = texel(uv[1], image.height);
    let start = (y * image.width as usize + x) * channels;
    let pixel = image.pixels.get(start..start + channels)?;
    let channel = |i: usize| srgb_to_linear(f32::from(pixel[i.min(channels - 1)]) / 255.0);
    Some(match channels {
        1 | 2 => Vec3::splat(channel(0)),
        _ => Vec3::new(channel(0), channel(1), channel(2)),
    })
}

#[cfg(not(target_arch = "wasm32"))]
pub use loader::ModelLoader;

#[cfg(not(target_arch = "wasm32"))]
mod loader {
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Receiver, TryRecvError};
    use std::thread;

    use log::info;

    use super::{load_model, AssetError};
    use crate::mesh::MeshData;

    /// Loads a model on a background thread; the result is picked up with [`ModelLoader::poll`].
    pub struct ModelLoader {
        receiver: Receiver<Result<MeshData, AssetError>>,
        finished: bool,
    }

    impl ModelLoader {
        pub fn spawn(path: impl Into<PathBuf>) -> Self {
            let path = path.into();
            let (sender, receiver) = mpsc::channel();
            thread::spawn(move || {
                info!("loading model {}", path.display());
                // The receiver may be gone if the game already closed.
                let _ = sender.send(load_model(&path));
            });
            Self {
                receiver,
                finished: false,
            }
        }

        /// Returns the load result once, as soon as it is available.
        pub fn poll(&mut self) -> Option<Result<MeshData, AssetError>> {
            if self.finished {
                return None;
            }
            let result = match self.receiver.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => Err(AssetError::Disconnected),
            };
            self.finished = true;
            Some(result)
        }

        /// Blocks until the result arrives.
        pub fn wait(mut self) -> Result<MeshData, AssetError> {
            if self.finished {
                return Err(AssetError::Disconnected);
            }
            self.finished = true;
            self.receiver
                .recv()
                .unwrap_or(Err(AssetError::Disconnected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_gltf(translation: [f32; 3], color: [f32; 4]) -> String {
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "mesh": 0, "translation": [{}, {}, {}] }}],
  "materials": [{{ "pbrMetallicRoughness": {{ "baseColorFactor": [{}, {}, {}, {}] }} }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }}],
  "buffers": [{{
    "byteLength": 36,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
  }}],
  "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
  "accessors": [{{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }}]
}}"#,
            translation[0], translation[1], translation[2], color[0], color[1], color[2], color[3]
        )
    }

    #[test]
    fn flattens_node_transforms_and_material_colour() {
        let json = triangle_gltf([0.0, 2.0, 0.0], [0.5, 0.25, 1.0, 1.0]);
        let mesh = load_model_from_slice(json.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.position(1), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(mesh.normal(0), Vec3::Y);
        assert_eq!(&mesh.vertices[6..9], &[0.5, 0.25, 1.0]);
    }

    #[test]
    fn base_colour_texture_tints_each_vertex() {
        // 2x1 RGBA texture: red on the left, blue on the right.
        let json = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0 }],
  "images": [{ "uri": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAIAAAABCAYAAAD0In+KAAAADklEQVR4nGP4z8AAQv8BD/kD/YURmXYAAAAASUVORK5CYII=" }],
  "textures": [{ "source": 0 }],
  "materials": [{ "pbrMetallicRoughness": {
    "baseColorFactor": [0.5, 1.0, 1.0, 1.0],
    "baseColorTexture": { "index": 0 }
  } }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "material": 0 }] }],
  "buffers": [{
    "byteLength": 60,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAACAPgAAAD8AAEA/AAAAPwAAgD4AAAA/"
  }],
  "bufferViews": [
    { "buffer": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 24 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" }
  ]
}"#;
        let mesh = load_model_from_slice(json.as_bytes()).unwrap();
        assert_eq!(&mesh.vertices[6..9], &[0.5, 0.0, 0.0]);
        assert_eq!(&mesh.vertices[15..18], &[0.0, 0.0, 1.0]);
        assert_eq!(&mesh.vertices[24..27], &[0.5, 0.0, 0.0]);
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = load_model_from_slice(b"definitely not gltf").unwrap_err();
        assert!(matches!(err, AssetError::Parse(_)));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_model("does/not/exist.gltf").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.gltf"));
    }

    #[test]
    fn background_loader_reports_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doll.gltf");
        std::fs::write(&path, triangle_gltf([0.0; 3], [1.0; 4])).unwrap();

        let mut loader = ModelLoader::spawn(&path);
        let result = loop {
            if let Some(result) = loader.poll() {
                break result;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_eq!(result.unwrap().vertex_count(), 3);
        assert!(loader.poll().is_none());
    }
}
