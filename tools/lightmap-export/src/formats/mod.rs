//! Writers for exported lightmap assets
//!
//! Header layouts live in lightmap-common.

pub use lightmap_common::formats::*;

use anyhow::{Context, Result};
use std::io::Write;

use crate::mesh::PackedMesh;
use crate::texture::LinearImage;

/// Write a complete `.lmmesh` file: header, vertex data, u16 indices
pub fn write_lightmap_mesh<W: Write>(w: &mut W, mesh: &PackedMesh) -> Result<()> {
    let header = LightmapMeshHeader::new(mesh.vertex_count, mesh.index_count, mesh.format);
    w.write_all(&header.to_bytes())?;
    w.write_all(&mesh.vertex_data)?;
    for i in &mesh.indices {
        w.write_all(&i.to_le_bytes())?;
    }
    Ok(())
}

/// Write a complete `.lmtex` file: header followed by RGBA8 pixels
pub fn write_lightmap_texture<W: Write>(w: &mut W, image: &LinearImage) -> Result<()> {
    let header = LightmapTextureHeader::try_from_u32(image.width, image.height)
        .with_context(|| {
            format!(
                "Texture {}x{} exceeds the 65535 pixel limit",
                image.width, image.height
            )
        })?;
    w.write_all(&header.to_bytes())?;
    w.write_all(&image.to_rgba8())?;
    Ok(())
}
