//! Lightmap material description and the material conversion collaborator
//!
//! After encoding, the processed objects and a [`LightmapInfo`] record are
//! handed to a [`MaterialConverter`], which builds materials that sample the
//! combined texture at UVs rebuilt from the `UVColors` layer.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::LightmapError;
use crate::formats::{
    write_lightmap_mesh, write_lightmap_texture, LIGHTMAP_MESH_EXT, LIGHTMAP_TEXTURE_EXT,
};
use crate::mesh::{pack_mesh, LIGHTMAP_UV_NAME, UV_COLOR_LAYER_NAME};
use crate::scene::{ObjectId, Scene};
use crate::texture::store::ImageId;

/// Base material the converter derives lightmapped materials from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BaseMaterial {
    #[serde(rename = "sm64_lightmap_texture")]
    LightmapTexture,
    #[serde(rename = "sm64_lightmap_fog_texture")]
    LightmapFogTexture,
}

impl BaseMaterial {
    pub fn for_fog(fog: bool) -> Self {
        if fog {
            BaseMaterial::LightmapFogTexture
        } else {
            BaseMaterial::LightmapTexture
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BaseMaterial::LightmapTexture => "sm64_lightmap_texture",
            BaseMaterial::LightmapFogTexture => "sm64_lightmap_fog_texture",
        }
    }
}

/// What the material converter needs to know about the lightmap
#[derive(Debug, Clone, PartialEq)]
pub struct LightmapInfo {
    /// UV layer the material refers to. Always `Lightmap`, even when a mesh
    /// reused an existing secondary layer under another name.
    pub uv: String,
    /// Combined texture
    pub tex: ImageId,
    pub material: BaseMaterial,
}

impl LightmapInfo {
    pub fn new(tex: ImageId, fog: bool) -> Self {
        Self {
            uv: LIGHTMAP_UV_NAME.to_string(),
            tex,
            material: BaseMaterial::for_fog(fog),
        }
    }
}

/// Builds lightmapped materials for processed objects
pub trait MaterialConverter {
    /// `apply_defaults` asks the converter to also run its own default
    /// material setup; the lightmap operator always passes `false`.
    fn convert(
        &mut self,
        scene: &mut Scene,
        objects: &[ObjectId],
        apply_defaults: bool,
        info: &LightmapInfo,
    ) -> Result<()>;
}

/// Assigns the base material in the scene and registers every object as a
/// user of the combined texture
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignMaterial;

impl MaterialConverter for AssignMaterial {
    fn convert(
        &mut self,
        scene: &mut Scene,
        objects: &[ObjectId],
        _apply_defaults: bool,
        info: &LightmapInfo,
    ) -> Result<()> {
        assign_material(scene, objects, info)
    }
}

fn assign_material(scene: &mut Scene, objects: &[ObjectId], info: &LightmapInfo) -> Result<()> {
    for &id in objects {
        let object = scene.object_mut(id)?;
        object.material = Some(info.material.as_str().to_string());
        let owner = object.name.clone();
        scene.images.add_user(info.tex, &owner)?;
    }
    Ok(())
}

/// Material description written next to each exported mesh
#[derive(Debug, Serialize)]
struct MaterialSidecar<'a> {
    object: &'a str,
    material: BaseMaterial,
    uv: &'a str,
    color_layer: &'a str,
    texture: String,
    apply_defaults: bool,
}

/// Writes the combined texture and one packed mesh plus material sidecar per
/// object into `out_dir`, then assigns materials like [`AssignMaterial`]
#[derive(Debug)]
pub struct ExportConverter {
    out_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl ExportConverter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            written: Vec::new(),
        }
    }

    /// Every file written so far, in write order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn create(&mut self, path: &Path) -> Result<BufWriter<File>> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        self.written.push(path.to_path_buf());
        Ok(BufWriter::new(file))
    }

    fn write_texture(&mut self, scene: &Scene, tex: ImageId) -> Result<String> {
        let stored = scene
            .images
            .get(tex)
            .ok_or(LightmapError::MissingImage(tex))?;

        let png_name = format!("{}.png", stored.name);
        let png_path = self.out_dir.join(&png_name);
        let png = match stored.packed_data() {
            Some(bytes) => bytes.to_vec(),
            None => stored.image.encode_png()?,
        };
        fs::write(&png_path, png).with_context(|| format!("Failed to write {:?}", png_path))?;
        self.written.push(png_path);

        let tex_path = self
            .out_dir
            .join(format!("{}.{}", stored.name, LIGHTMAP_TEXTURE_EXT));
        let mut w = self.create(&tex_path)?;
        write_lightmap_texture(&mut w, &stored.image)?;
        w.flush()?;

        tracing::info!(
            "Exported lightmap texture '{}' ({}x{})",
            stored.name,
            stored.image.width,
            stored.image.height
        );
        Ok(png_name)
    }
}

impl MaterialConverter for ExportConverter {
    fn convert(
        &mut self,
        scene: &mut Scene,
        objects: &[ObjectId],
        apply_defaults: bool,
        info: &LightmapInfo,
    ) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("Failed to create output directory {:?}", self.out_dir))?;

        let texture = self.write_texture(scene, info.tex)?;

        for &id in objects {
            let object = scene.object(id)?;
            let mesh = object
                .mesh_data()
                .with_context(|| format!("Object '{}' has no mesh data", object.name))?;
            let color = mesh
                .color_layer_index(UV_COLOR_LAYER_NAME)
                .ok_or_else(|| {
                    LightmapError::precondition("Could not generate or find vertex colors.")
                })?;
            if mesh.uv_layer_index(&info.uv).is_none() {
                tracing::warn!(
                    "Mesh '{}' has no UV layer named '{}'",
                    object.name,
                    info.uv
                );
            }

            let packed = pack_mesh(mesh, Some(color))?;
            let mesh_path = self
                .out_dir
                .join(format!("{}.{}", object.name, LIGHTMAP_MESH_EXT));
            let mut w = self.create(&mesh_path)?;
            write_lightmap_mesh(&mut w, &packed)?;
            w.flush()?;

            let sidecar = MaterialSidecar {
                object: &object.name,
                material: info.material,
                uv: &info.uv,
                color_layer: UV_COLOR_LAYER_NAME,
                texture: texture.clone(),
                apply_defaults,
            };
            let sidecar_path = self.out_dir.join(format!("{}.material.json", object.name));
            let json = serde_json::to_string_pretty(&sidecar)?;
            fs::write(&sidecar_path, json)
                .with_context(|| format!("Failed to write {:?}", sidecar_path))?;
            self.written.push(sidecar_path);

            tracing::info!(
                "Exported '{}': {} vertices, {} indices",
                object.name,
                packed.vertex_count,
                packed.index_count
            );
        }

        assign_material(scene, objects, info)
    }
}
