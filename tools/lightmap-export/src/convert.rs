//! Lightmap conversion of the selected mesh objects
//!
//! [`convert_for_lightmap`] checks preconditions, combines the bakes once,
//! then optionally duplicates each selected mesh, provisions the `Lightmap` UV
//! and `UVColors` layers, encodes UVs into colors and hands everything to the
//! material converter. The first failure aborts the batch; objects processed
//! before it stay modified, as does the combined image.
//!
//! [`apply_lightmap`] is the user-facing operator around it.

use crate::combine::{
    combine_lightmaps, ClampPolicy, CombineSettings, CombinedLightmap, CombinedNaming,
    DEFAULT_AO_STRENGTH,
};
use crate::error::{LightmapError, Result};
use crate::material::{LightmapInfo, MaterialConverter};
use crate::mesh::{
    encode_uv_to_colors, ensure_color_layer, ensure_lightmap_uv, UvUnwrapper, UV_COLOR_LAYER_NAME,
};
use crate::scene::{InteractionMode, ObjectId, Scene};
use crate::texture::store::{EvictionPolicy, ImageId};

/// User-facing parameters of a lightmap conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightmapSettings {
    pub lightmap: ImageId,
    pub ao: Option<ImageId>,
    /// Not range-checked
    pub ao_strength: f32,
    /// Selects the fog variant of the base material
    pub fog: bool,
    /// Convert selected objects in place instead of mapped copies
    pub replace_originals: bool,
    pub clamp: ClampPolicy,
    pub naming: CombinedNaming,
}

impl LightmapSettings {
    pub fn new(lightmap: ImageId) -> Self {
        Self {
            lightmap,
            ao: None,
            ao_strength: DEFAULT_AO_STRENGTH,
            fog: false,
            replace_originals: false,
            clamp: ClampPolicy::None,
            naming: CombinedNaming::Truncated,
        }
    }

    pub fn combine_settings(&self) -> CombineSettings {
        CombineSettings {
            ao_strength: self.ao_strength,
            clamp: self.clamp,
            naming: self.naming,
        }
    }
}

/// Outcome of a successful conversion
#[derive(Debug, Clone)]
pub struct LightmapConversion {
    /// Objects that received encoded colors (copies unless replacing)
    pub objects: Vec<ObjectId>,
    pub combined: CombinedLightmap,
    pub info: LightmapInfo,
}

/// Convert every selected mesh object for lightmapped rendering
pub fn convert_for_lightmap(
    scene: &mut Scene,
    settings: &LightmapSettings,
    unwrapper: &dyn UvUnwrapper,
    eviction: &mut dyn EvictionPolicy,
    converter: &mut dyn MaterialConverter,
) -> Result<LightmapConversion> {
    if scene.mode != InteractionMode::Object {
        return Err(LightmapError::precondition(
            "Operator can only be used in object mode.",
        ));
    }

    let selected = scene.selected_meshes();
    let Some(&first) = selected.first() else {
        return Err(LightmapError::precondition("No mesh objects selected."));
    };
    if !scene.images.contains(settings.lightmap) {
        return Err(LightmapError::MissingImage(settings.lightmap));
    }

    // Combined image is named after the active object, else the first selected mesh
    let name_source = scene.active().unwrap_or(first);
    let source_name = scene.object(name_source)?.name.clone();

    // A bad lightmap or AO fails before any object is touched
    let combined = combine_lightmaps(
        &mut scene.images,
        settings.lightmap,
        settings.ao,
        &source_name,
        &settings.combine_settings(),
        eviction,
    )?;

    let mut processed = Vec::with_capacity(selected.len());
    for original in selected {
        let id = if settings.replace_originals {
            original
        } else {
            scene.duplicate_for_mapping(original)?
        };
        encode_object(scene, id, unwrapper)?;
        processed.push(id);
    }

    let info = LightmapInfo::new(combined.id, settings.fog);
    converter
        .convert(scene, &processed, false, &info)
        .map_err(|err| match err.downcast::<LightmapError>() {
            Ok(err) => err,
            Err(err) => LightmapError::Conversion(err),
        })?;

    tracing::info!(
        "Converted {} object(s) for lightmap '{}'",
        processed.len(),
        combined.name
    );
    Ok(LightmapConversion {
        objects: processed,
        combined,
        info,
    })
}

/// Provision the lightmap channels of one object and encode its UVs
fn encode_object(scene: &mut Scene, id: ObjectId, unwrapper: &dyn UvUnwrapper) -> Result<()> {
    let needs_unwrap = mesh_mut(scene, id)?.uv_layers.len() == 1;

    if needs_unwrap {
        scene.mode = InteractionMode::Edit;
    }
    let uv = ensure_lightmap_uv(mesh_mut(scene, id)?, unwrapper);
    scene.mode = InteractionMode::Object;
    let uv = uv?;

    let mesh = mesh_mut(scene, id)?;
    let color = ensure_color_layer(mesh, UV_COLOR_LAYER_NAME);
    let corners = encode_uv_to_colors(mesh, uv, color)?;
    tracing::debug!(
        "Encoded {} corners of '{}' from UV layer '{}'",
        corners,
        mesh.name,
        mesh.uv_layers[uv].name
    );
    Ok(())
}

fn mesh_mut(scene: &mut Scene, id: ObjectId) -> Result<&mut crate::mesh::Mesh> {
    scene
        .object_mut(id)?
        .mesh_data_mut()
        .ok_or(LightmapError::MissingObject(id))
}

/// Report returned by [`apply_lightmap`]
#[derive(Debug)]
pub enum OperatorReport {
    Finished(LightmapConversion),
    Cancelled { message: String },
}

impl OperatorReport {
    pub fn is_finished(&self) -> bool {
        matches!(self, OperatorReport::Finished(_))
    }
}

/// Run [`convert_for_lightmap`] as an operator
///
/// Switches to object mode first. On failure the scene is put back into
/// object mode and the error becomes a single message.
pub fn apply_lightmap(
    scene: &mut Scene,
    settings: &LightmapSettings,
    unwrapper: &dyn UvUnwrapper,
    eviction: &mut dyn EvictionPolicy,
    converter: &mut dyn MaterialConverter,
) -> OperatorReport {
    if scene.mode != InteractionMode::Object {
        scene.mode = InteractionMode::Object;
    }

    match convert_for_lightmap(scene, settings, unwrapper, eviction, converter) {
        Ok(conversion) => {
            tracing::info!("Success!");
            OperatorReport::Finished(conversion)
        }
        Err(err) => {
            if scene.mode != InteractionMode::Object {
                scene.mode = InteractionMode::Object;
            }
            tracing::error!("{}", err);
            OperatorReport::Cancelled {
                message: err.to_string(),
            }
        }
    }
}
