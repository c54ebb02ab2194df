//! Vertex packing for exported lightmapped meshes
//!
//! One packed vertex per face corner, so per-corner UVs and encoded colors
//! survive unchanged. Polygons are fan-triangulated.

use bytemuck::cast_slice;
use lightmap_common::{
    pack_color_rgba_unorm8, pack_position_f16, pack_uv_unorm16, vertex_stride_packed,
    FORMAT_COLOR, FORMAT_UV,
};

use super::Mesh;
use crate::error::{LightmapError, Result};

/// Largest vertex index addressable by u16 index buffers
pub const MAX_INDEX_VALUE: u32 = u16::MAX as u32;

/// Mesh ready to be written as a `.lmmesh` file
#[derive(Debug, Clone, PartialEq)]
pub struct PackedMesh {
    pub format: u8,
    pub vertex_count: u32,
    pub index_count: u32,
    pub vertex_data: Vec<u8>,
    pub indices: Vec<u16>,
}

/// Pack a mesh for export
///
/// Layout per vertex: Position (f16x4) → UV (unorm16x2, primary layer) →
/// Color (unorm8x4, `color_layer`). Color lanes are rounded so bytes written
/// by the UV encoder come back exactly.
pub fn pack_mesh(mesh: &Mesh, color_layer: Option<usize>) -> Result<PackedMesh> {
    let corners = mesh.corner_count();
    if corners > MAX_INDEX_VALUE as usize + 1 {
        return Err(LightmapError::TooManyCorners {
            name: mesh.name.clone(),
            corners,
            max: MAX_INDEX_VALUE as usize + 1,
        });
    }

    let uvs = mesh.uv_layers.first().map(|l| l.data.as_slice());
    let colors = match color_layer {
        Some(index) => Some(
            mesh.color_layers
                .get(index)
                .map(|l| l.data.as_slice())
                .ok_or_else(|| LightmapError::precondition("Could not generate or find vertex colors."))?,
        ),
        None => None,
    };

    let mut format = 0u8;
    if uvs.is_some() {
        format |= FORMAT_UV;
    }
    if colors.is_some() {
        format |= FORMAT_COLOR;
    }

    let stride = vertex_stride_packed(format) as usize;
    let mut vertex_data = Vec::with_capacity(corners * stride);

    for (corner, &vertex) in mesh.loops.iter().enumerate() {
        // Position (f16x4) - 8 bytes
        let pos = mesh.positions[vertex as usize];
        let packed_pos = pack_position_f16(pos[0], pos[1], pos[2]);
        vertex_data.extend_from_slice(cast_slice(&packed_pos));

        // UV (unorm16x2) - 4 bytes
        if let Some(uvs) = uvs {
            let uv = uvs[corner];
            vertex_data.extend_from_slice(cast_slice(&pack_uv_unorm16(uv[0], uv[1])));
        }

        // Color (unorm8x4) - 4 bytes
        if let Some(colors) = colors {
            let c = colors[corner];
            vertex_data.extend_from_slice(&pack_color_rgba_unorm8(c[0], c[1], c[2], c[3]));
        }
    }

    let mut indices = Vec::new();
    for face in &mesh.faces {
        let first = face.loop_start as u16;
        for i in 1..face.loop_total - 1 {
            let b = (face.loop_start + i) as u16;
            indices.extend_from_slice(&[first, b, b + 1]);
        }
    }

    Ok(PackedMesh {
        format,
        vertex_count: corners as u32,
        index_count: indices.len() as u32,
        vertex_data,
        indices,
    })
}
