//! Lightmap UV and color channel provisioning

use super::unwrap::UvUnwrapper;
use super::Mesh;
use crate::error::{LightmapError, Result};

/// Name of an auto-generated secondary UV layer
pub const LIGHTMAP_UV_NAME: &str = "Lightmap";

/// Name of the color layer holding encoded lightmap UVs
pub const UV_COLOR_LAYER_NAME: &str = "UVColors";

/// Return the index of the mesh's secondary UV layer, unwrapping a new
/// `Lightmap` layer when only the primary one exists
///
/// A mesh without any UV layer is rejected. When a new layer is unwrapped the
/// active UV index goes back to the primary layer afterwards. A failed unwrap
/// leaves the new layer in place.
pub fn ensure_lightmap_uv(mesh: &mut Mesh, unwrapper: &dyn UvUnwrapper) -> Result<usize> {
    match mesh.uv_layers.len() {
        0 => Err(LightmapError::precondition("No regular UV map.")),
        1 => {
            let layer = mesh.add_uv_layer(LIGHTMAP_UV_NAME);
            mesh.active_uv = layer;
            let unwrapped = unwrapper.apply(mesh, layer);
            mesh.active_uv = 0;

            if !unwrapped {
                return Err(LightmapError::precondition(
                    "Could not generate or find second uv map.",
                ));
            }
            tracing::debug!("Unwrapped '{}' UVs for mesh '{}'", LIGHTMAP_UV_NAME, mesh.name);
            Ok(layer)
        }
        _ => Ok(1),
    }
}

/// Return the index of the color layer `name`, creating it if absent
pub fn ensure_color_layer(mesh: &mut Mesh, name: &str) -> usize {
    mesh.color_layer_index(name)
        .unwrap_or_else(|| mesh.add_color_layer(name))
}
