//! Lightmap pipeline binary asset formats
//!
//! These are POD (Plain Old Data) formats for GPU-ready assets.
//! No magic bytes - the format is determined by the file extension.

pub mod mesh;
pub mod texture;

pub use mesh::*;
pub use texture::*;

/// File extension for packed meshes
pub const LIGHTMAP_MESH_EXT: &str = "lmmesh";
/// File extension for RGBA8 textures
pub const LIGHTMAP_TEXTURE_EXT: &str = "lmtex";
