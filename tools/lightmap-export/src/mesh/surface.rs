//! Face/corner access used by the encoder

use std::ops::Range;

use super::Mesh;

/// Minimal view of a polygon mesh: faces, their corners, and per-corner
/// UV and color channels addressed by index
pub trait MeshSurface {
    fn face_count(&self) -> usize;

    /// Corner indices belonging to `face`
    fn face_corners(&self, face: usize) -> Range<usize>;

    fn uv_channel_count(&self) -> usize;

    fn color_channel_count(&self) -> usize;

    fn corner_uv(&self, channel: usize, corner: usize) -> [f32; 2];

    fn set_corner_color(&mut self, channel: usize, corner: usize, color: [f32; 4]);
}

impl MeshSurface for Mesh {
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn face_corners(&self, face: usize) -> Range<usize> {
        self.faces[face].corners()
    }

    fn uv_channel_count(&self) -> usize {
        self.uv_layers.len()
    }

    fn color_channel_count(&self) -> usize {
        self.color_layers.len()
    }

    #[inline]
    fn corner_uv(&self, channel: usize, corner: usize) -> [f32; 2] {
        self.uv_layers[channel].data[corner]
    }

    #[inline]
    fn set_corner_color(&mut self, channel: usize, corner: usize, color: [f32; 4]) {
        self.color_layers[channel].data[corner] = color;
    }
}
