//! glTF/GLB mesh loading
//!
//! Every glTF mesh becomes one [`Mesh`]; its triangle primitives are merged.
//! `TEXCOORD_n` sets present on all primitives become UV layers in order, so a
//! baked lightmap set in `TEXCOORD_1` is picked up as the secondary layer.

use anyhow::{Context, Result};
use gltf::mesh::Mode;
use gltf::Semantic;
use std::path::Path;

use super::obj::PRIMARY_UV_NAME;
use super::Mesh;

/// Name of the imported `COLOR_0` layer
const IMPORTED_COLOR_NAME: &str = "Col";

fn uv_layer_name(set: u32) -> String {
    if set == 0 {
        PRIMARY_UV_NAME.to_string()
    } else {
        format!("{PRIMARY_UV_NAME}.{set:03}")
    }
}

/// Load every mesh in a glTF/GLB file
pub fn load_gltf(input: &Path) -> Result<Vec<Mesh>> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let mut meshes = Vec::new();
    for gltf_mesh in document.meshes() {
        let name = gltf_mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Mesh{}", gltf_mesh.index()));

        let primitives: Vec<_> = gltf_mesh
            .primitives()
            .filter(|p| {
                let triangles = p.mode() == Mode::Triangles;
                if !triangles {
                    tracing::warn!("Skipping non-triangle primitive in mesh '{}'", name);
                }
                triangles
            })
            .collect();
        if primitives.is_empty() {
            tracing::warn!("Mesh '{}' has no triangle primitives, skipping", name);
            continue;
        }

        // UV sets and colors only count when every primitive carries them
        let uv_sets = primitives
            .iter()
            .map(|p| (0..).take_while(|&n| p.get(&Semantic::TexCoords(n)).is_some()).count())
            .min()
            .unwrap_or(0);
        let has_colors = primitives
            .iter()
            .all(|p| p.get(&Semantic::Colors(0)).is_some());

        let mut mesh = Mesh::new(name);
        let mut corner_uvs: Vec<Vec<[f32; 2]>> = vec![Vec::new(); uv_sets];
        let mut corner_colors: Vec<[f32; 4]> = Vec::new();

        for primitive in &primitives {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .with_context(|| format!("No positions in mesh '{}'", mesh.name))?
                .collect();
            let base = mesh.positions.len() as u32;

            let uvs: Vec<Vec<[f32; 2]>> = (0..uv_sets as u32)
                .map(|set| {
                    reader
                        .read_tex_coords(set)
                        .map(|iter| iter.into_f32().collect())
                        .unwrap_or_default()
                })
                .collect();
            let colors: Vec<[f32; 4]> = if has_colors {
                reader
                    .read_colors(0)
                    .map(|iter| iter.into_rgba_f32().collect())
                    .unwrap_or_default()
            } else {
                Vec::new()
            };

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|iter| iter.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            for tri in indices.chunks_exact(3) {
                let vertices = [base + tri[0], base + tri[1], base + tri[2]];
                mesh.add_face(&vertices);
                for &i in tri {
                    let i = i as usize;
                    for (set, data) in uvs.iter().enumerate() {
                        corner_uvs[set].push(data.get(i).copied().unwrap_or([0.0, 0.0]));
                    }
                    if has_colors {
                        corner_colors.push(colors.get(i).copied().unwrap_or([1.0; 4]));
                    }
                }
            }

            mesh.positions.extend(positions);
        }

        for (set, data) in corner_uvs.into_iter().enumerate() {
            let layer = mesh.add_uv_layer(&uv_layer_name(set as u32));
            mesh.uv_layers[layer].data = data;
        }
        if has_colors {
            let layer = mesh.add_color_layer(IMPORTED_COLOR_NAME);
            mesh.color_layers[layer].data = corner_colors;
        }

        mesh.validate()?;
        tracing::info!(
            "Loaded glTF mesh '{}': {} vertices, {} faces, {} UV layers",
            mesh.name,
            mesh.positions.len(),
            mesh.faces.len(),
            mesh.uv_layers.len()
        );
        meshes.push(mesh);
    }

    if meshes.is_empty() {
        anyhow::bail!("No meshes found in glTF: {:?}", input);
    }
    Ok(meshes)
}
