//! Shared types and utilities for the lightmap vertex-color pipeline
//!
//! This crate provides host-free utilities shared between:
//! - `lightmap-export` (asset pipeline and CLI)
//! - runtime decoders that rebuild lightmap UVs from vertex colors
//!
//! # Modules
//!
//! - [`packing`] - UV-to-color fixed-point encoding and vertex packing
//! - [`color`] - Gamma curve used when combining lightmaps
//! - [`formats`] - Binary mesh and texture formats written by the exporter

pub mod color;
pub mod formats;
pub mod packing;

// Re-export commonly used packing items
pub use packing::{
    FORMAT_COLOR, FORMAT_UV, UV_QUANT_MAX, decode_uv_rgba8, encode_uv_color, encode_uv_rgba8,
    pack_color_rgba_unorm8, pack_position_f16, pack_uv_unorm16,
    quantize_uv_axis, unorm8_from_lane, vertex_stride_packed,
};

pub use color::{GAMMA_EXPONENT, gamma_correct};

// Re-export commonly used format items
pub use formats::{LIGHTMAP_MESH_EXT, LIGHTMAP_TEXTURE_EXT, LightmapMeshHeader, LightmapTextureHeader};
