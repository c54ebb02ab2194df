//! UV-to-color encoder
//!
//! Writes the lightmap UV of every corner into a color channel so a material
//! stage with a single UV input can rebuild it from vertex color.

use lightmap_common::encode_uv_color;

use super::surface::MeshSurface;
use crate::error::{LightmapError, Result};

/// Encode `uv_channel` into `color_channel`, one color per corner
///
/// Corners are encoded independently: no interpolation or sharing across
/// corners of the same vertex. Returns the number of corners written.
pub fn encode_uv_to_colors<M: MeshSurface + ?Sized>(
    mesh: &mut M,
    uv_channel: usize,
    color_channel: usize,
) -> Result<usize> {
    if uv_channel >= mesh.uv_channel_count() {
        return Err(LightmapError::precondition(
            "Could not generate or find second uv map.",
        ));
    }
    if color_channel >= mesh.color_channel_count() {
        return Err(LightmapError::precondition(
            "Could not generate or find vertex colors.",
        ));
    }

    let mut written = 0;
    for face in 0..mesh.face_count() {
        for corner in mesh.face_corners(face) {
            let [u, v] = mesh.corner_uv(uv_channel, corner);
            mesh.set_corner_color(color_channel, corner, encode_uv_color(u, v));
            written += 1;
        }
    }

    Ok(written)
}
