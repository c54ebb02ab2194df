//! lightmap-export library
//!
//! Converts baked lightmaps for targets that cannot sample a second UV set:
//! the lightmap UVs of every mesh corner are packed into a vertex color
//! layer, and the lightmap and ambient-occlusion bakes are combined into one
//! gamma-encoded texture.

pub mod combine;
pub mod convert;
pub mod error;
pub mod formats;
pub mod manifest;
pub mod material;
pub mod mesh;
pub mod naming;
pub mod scene;
pub mod texture;

// Re-export packing functions and vertex format constants from lightmap-common
pub use lightmap_common::{
    decode_uv_rgba8, encode_uv_color, encode_uv_rgba8, gamma_correct, quantize_uv_axis,
    vertex_stride_packed, FORMAT_COLOR, FORMAT_UV,
};

pub use combine::{combine_lightmaps, combine_pixels, ClampPolicy, CombineSettings, CombinedNaming};
pub use convert::{apply_lightmap, convert_for_lightmap, LightmapSettings, OperatorReport};
pub use error::{LightmapError, Result};
pub use material::{BaseMaterial, ExportConverter, LightmapInfo, MaterialConverter};
pub use mesh::{encode_uv_to_colors, Mesh, MeshSurface, SmartProject, UvUnwrapper};
pub use scene::{InteractionMode, ObjectId, Scene, SceneObject};
pub use texture::store::{EvictByName, EvictionPolicy, ImageId, ImageStore};
pub use texture::{ImageBuffer, LinearImage};
