//! OBJ mesh loading
//!
//! Polygons are kept as-is (no triangulation) so corner data lines up with
//! the faces an artist modelled. OBJ has a single texture coordinate set,
//! which becomes the primary UV layer when every corner references one.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::Mesh;

/// Name given to the primary UV layer of loaded meshes
pub(crate) const PRIMARY_UV_NAME: &str = "UVMap";

/// Load an OBJ file into a [`Mesh`] named after the file stem
pub fn load_obj(input: &Path) -> Result<Mesh> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Mesh");
    let mesh = parse_obj(BufReader::new(file), name)?;

    tracing::info!(
        "Loaded OBJ mesh '{}': {} vertices, {} faces, {} UV layers",
        mesh.name,
        mesh.positions.len(),
        mesh.faces.len(),
        mesh.uv_layers.len()
    );
    Ok(mesh)
}

/// Parse OBJ text into a mesh
pub(crate) fn parse_obj<R: BufRead>(reader: R, name: &str) -> Result<Mesh> {
    let mut mesh = Mesh::new(name);
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut corner_uvs: Vec<Option<[f32; 2]>> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" if parts.len() >= 4 => {
                let x: f32 = parts[1].parse().unwrap_or(0.0);
                let y: f32 = parts[2].parse().unwrap_or(0.0);
                let z: f32 = parts[3].parse().unwrap_or(0.0);
                mesh.positions.push([x, y, z]);
            }
            "vt" if parts.len() >= 3 => {
                let u: f32 = parts[1].parse().unwrap_or(0.0);
                let v: f32 = parts[2].parse().unwrap_or(0.0);
                tex_coords.push([u, v]);
            }
            "f" if parts.len() >= 4 => {
                let mut face_verts = Vec::with_capacity(parts.len() - 1);
                for token in &parts[1..] {
                    let Some(vertex) =
                        parse_obj_vertex(token, mesh.positions.len(), tex_coords.len())
                    else {
                        bail!("OBJ line {}: invalid face vertex '{}'", line_no + 1, token);
                    };
                    face_verts.push(vertex);
                }

                let mut vertices = Vec::with_capacity(face_verts.len());
                for (vi, vti) in face_verts {
                    if vi >= mesh.positions.len() {
                        bail!(
                            "OBJ line {}: face references missing vertex {}",
                            line_no + 1,
                            vi + 1
                        );
                    }
                    vertices.push(vi as u32);
                    corner_uvs.push(vti.and_then(|t| tex_coords.get(t).copied()));
                }
                mesh.add_face(&vertices);
            }
            _ => {}
        }
    }

    if mesh.faces.is_empty() {
        bail!("No faces found in OBJ file");
    }

    if corner_uvs.iter().all(Option::is_some) {
        let layer = mesh.add_uv_layer(PRIMARY_UV_NAME);
        mesh.uv_layers[layer].data = corner_uvs.into_iter().flatten().collect();
    } else if corner_uvs.iter().any(Option::is_some) {
        tracing::warn!(
            "OBJ mesh '{}' has texture coordinates on only some corners, ignoring them",
            name
        );
    }

    Ok(mesh)
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
///
/// Negative indices count back from the last element read so far.
fn parse_obj_vertex(
    s: &str,
    vertex_count: usize,
    tex_count: usize,
) -> Option<(usize, Option<usize>)> {
    let parts: Vec<&str> = s.split('/').collect();

    let vi = resolve_obj_index(parts.first()?, vertex_count)?;

    let vti = match parts.get(1).filter(|s| !s.is_empty()) {
        Some(t) => Some(resolve_obj_index(t, tex_count)?),
        None => None,
    };

    Some((vi, vti))
}

/// Convert a 1-based or negative OBJ index to a 0-based one
fn resolve_obj_index(token: &str, count: usize) -> Option<usize> {
    let index: i64 = token.parse().ok()?;
    if index > 0 {
        usize::try_from(index - 1).ok()
    } else if index < 0 {
        count.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)
    } else {
        None
    }
}
