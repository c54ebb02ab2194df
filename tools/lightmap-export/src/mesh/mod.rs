//! Mesh model and lightmap UV encoding
//!
//! Meshes keep polygons intact: each face owns a contiguous run of corners
//! (loops), and every UV or color layer stores one value per corner so seams
//! can diverge at a shared vertex.

mod channels;
mod encode;
mod gltf;
mod obj;
mod packing;
mod surface;
mod unwrap;

pub use channels::{
    ensure_color_layer, ensure_lightmap_uv, LIGHTMAP_UV_NAME, UV_COLOR_LAYER_NAME,
};
pub use encode::encode_uv_to_colors;
pub use gltf::load_gltf;
pub use obj::load_obj;
pub use packing::{pack_mesh, PackedMesh, MAX_INDEX_VALUE};
pub use surface::MeshSurface;
pub use unwrap::{SmartProject, UvUnwrapper};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hashbrown::HashSet;

use crate::formats::{write_lightmap_mesh, LIGHTMAP_MESH_EXT};
use crate::naming::{dedup_name, file_name_part};

/// Polygon as a run of corners in [`Mesh::loops`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub loop_start: usize,
    pub loop_total: usize,
}

impl Face {
    #[inline]
    pub fn corners(&self) -> Range<usize> {
        self.loop_start..self.loop_start + self.loop_total
    }
}

/// Named per-corner UV set
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    pub name: String,
    pub data: Vec<[f32; 2]>,
}

/// Named per-corner RGBA color set. Lanes are floats in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLayer {
    pub name: String,
    pub data: Vec<[f32; 4]>,
}

/// Polygon mesh with per-corner attribute layers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub faces: Vec<Face>,
    /// Corner → vertex index
    pub loops: Vec<u32>,
    pub uv_layers: Vec<UvLayer>,
    pub color_layers: Vec<ColorLayer>,
    /// Index of the UV layer tools operate on
    pub active_uv: usize,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a polygon over existing vertices. Existing layers grow with
    /// zero UVs and white colors.
    pub fn add_face(&mut self, vertices: &[u32]) -> usize {
        let loop_start = self.loops.len();
        self.loops.extend_from_slice(vertices);
        for layer in &mut self.uv_layers {
            layer.data.resize(self.loops.len(), [0.0, 0.0]);
        }
        for layer in &mut self.color_layers {
            layer.data.resize(self.loops.len(), [1.0, 1.0, 1.0, 1.0]);
        }
        self.faces.push(Face {
            loop_start,
            loop_total: vertices.len(),
        });
        self.faces.len() - 1
    }

    #[inline]
    pub fn corner_count(&self) -> usize {
        self.loops.len()
    }

    pub fn uv_layer_index(&self, name: &str) -> Option<usize> {
        self.uv_layers.iter().position(|l| l.name == name)
    }

    pub fn color_layer_index(&self, name: &str) -> Option<usize> {
        self.color_layers.iter().position(|l| l.name == name)
    }

    /// Add a UV layer with one zero UV per corner
    pub fn add_uv_layer(&mut self, name: &str) -> usize {
        self.uv_layers.push(UvLayer {
            name: name.to_string(),
            data: vec![[0.0, 0.0]; self.loops.len()],
        });
        self.uv_layers.len() - 1
    }

    /// Add a color layer with one white color per corner
    pub fn add_color_layer(&mut self, name: &str) -> usize {
        self.color_layers.push(ColorLayer {
            name: name.to_string(),
            data: vec![[1.0, 1.0, 1.0, 1.0]; self.loops.len()],
        });
        self.color_layers.len() - 1
    }

    /// Check that faces, loops and layers agree with each other
    pub fn validate(&self) -> Result<()> {
        let mut expected_start = 0;
        for (i, face) in self.faces.iter().enumerate() {
            if face.loop_start != expected_start || face.loop_total < 3 {
                bail!("Mesh '{}': face {} has an invalid corner range", self.name, i);
            }
            expected_start += face.loop_total;
        }
        if expected_start != self.loops.len() {
            bail!(
                "Mesh '{}': faces cover {} corners, mesh has {}",
                self.name,
                expected_start,
                self.loops.len()
            );
        }
        if let Some(&v) = self
            .loops
            .iter()
            .find(|&&v| v as usize >= self.positions.len())
        {
            bail!("Mesh '{}': corner references missing vertex {}", self.name, v);
        }
        for layer in &self.uv_layers {
            if layer.data.len() != self.loops.len() {
                bail!("Mesh '{}': UV layer '{}' size mismatch", self.name, layer.name);
            }
        }
        for layer in &self.color_layers {
            if layer.data.len() != self.loops.len() {
                bail!("Mesh '{}': color layer '{}' size mismatch", self.name, layer.name);
            }
        }
        Ok(())
    }
}

/// Load every mesh in a file, picking the loader by extension
pub fn load_meshes(path: &Path) -> Result<Vec<Mesh>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "obj" => Ok(vec![load_obj(path)?]),
        "gltf" | "glb" => load_gltf(path),
        _ => bail!("Unsupported mesh format: {:?} (use .obj, .gltf, or .glb)", path),
    }
}

/// Provision lightmap channels, encode UVs into `UVColors` and write packed
/// meshes. A file with several meshes writes `<output stem>_<mesh>.lmmesh`
/// per mesh, with the mesh name reduced to a file name component and
/// repeated names suffixed `.001`, `.002`, ...
pub fn encode_mesh_file(
    input: &Path,
    output: &Path,
    unwrapper: &dyn UvUnwrapper,
) -> Result<Vec<PathBuf>> {
    let meshes = load_meshes(input)?;
    let single = meshes.len() == 1;
    let mut written = Vec::with_capacity(meshes.len());
    let mut used = HashSet::new();

    for mut mesh in meshes {
        let uv = ensure_lightmap_uv(&mut mesh, unwrapper)?;
        let color = ensure_color_layer(&mut mesh, UV_COLOR_LAYER_NAME);
        encode_uv_to_colors(&mut mesh, uv, color)?;
        let packed = pack_mesh(&mesh, Some(color))?;

        let path = if single {
            output.to_path_buf()
        } else {
            per_mesh_output(output, &mesh.name, &mut used)
        };
        let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut w = BufWriter::new(file);
        write_lightmap_mesh(&mut w, &packed)?;
        w.flush()?;

        tracing::info!(
            "Encoded '{}' -> {:?}: {} vertices, {} indices",
            mesh.name,
            path,
            packed.vertex_count,
            packed.index_count
        );
        written.push(path);
    }

    Ok(written)
}

/// `<output stem>_<mesh>.lmmesh` next to `output`, unique among `used`
fn per_mesh_output(output: &Path, mesh_name: &str, used: &mut HashSet<String>) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh");
    let base = format!("{}_{}", stem, file_name_part(mesh_name));
    let name = dedup_name(&base, |n| used.contains(n));
    let path = output.with_file_name(format!("{}.{}", name, LIGHTMAP_MESH_EXT));
    used.insert(name);
    path
}

#[cfg(test)]
pub(crate) mod test_meshes {
    use super::Mesh;

    /// Unit quad in the XY plane with one UV layer mirroring positions
    pub fn quad() -> Mesh {
        let mut mesh = Mesh::new("Quad");
        mesh.positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        mesh.add_uv_layer("UVMap");
        mesh.add_face(&[0, 1, 2, 3]);
        mesh.uv_layers[0].data = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        mesh
    }

    /// Axis-aligned unit cube, six quads, with a flat primary UV layer
    pub fn cube() -> Mesh {
        let mut mesh = Mesh::new("Cube");
        mesh.positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        mesh.add_uv_layer("UVMap");
        for face in [
            [0, 3, 2, 1], // -Z
            [4, 5, 6, 7], // +Z
            [0, 1, 5, 4], // -Y
            [3, 7, 6, 2], // +Y
            [0, 4, 7, 3], // -X
            [1, 2, 6, 5], // +X
        ] {
            mesh.add_face(&face);
        }
        for (i, uv) in mesh.uv_layers[0].data.iter_mut().enumerate() {
            let corner = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]][i % 4];
            *uv = corner;
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_face_grows_layers() {
        let mut mesh = test_meshes::quad();
        mesh.add_color_layer("Col");
        mesh.positions.push([2.0, 0.0, 0.0]);
        let face = mesh.add_face(&[1, 4, 2]);

        assert_eq!(face, 1);
        assert_eq!(mesh.corner_count(), 7);
        assert_eq!(mesh.faces[1].corners(), 4..7);
        assert_eq!(mesh.uv_layers[0].data.len(), 7);
        assert_eq!(mesh.color_layers[0].data[6], [1.0, 1.0, 1.0, 1.0]);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_validate_catches_bad_vertex() {
        let mut mesh = test_meshes::quad();
        mesh.loops[2] = 99;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_layer_lookup() {
        let mut mesh = test_meshes::cube();
        assert_eq!(mesh.uv_layer_index("UVMap"), Some(0));
        assert_eq!(mesh.uv_layer_index("Lightmap"), None);
        let idx = mesh.add_color_layer("UVColors");
        assert_eq!(mesh.color_layer_index("UVColors"), Some(idx));
        assert_eq!(mesh.color_layers[idx].data.len(), 24);
    }

    #[test]
    fn test_load_meshes_rejects_unknown_extension() {
        assert!(load_meshes(Path::new("scene.fbx")).is_err());
    }

    #[test]
    fn test_encode_mesh_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("floor.obj");
        std::fs::write(
            &input,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nf 1/1 2/2 3/3 4/4\n",
        )
        .unwrap();
        let output = dir.path().join("floor.lmmesh");

        let written = encode_mesh_file(&input, &output, &SmartProject::default()).unwrap();
        assert_eq!(written, vec![output.clone()]);

        let bytes = std::fs::read(&output).unwrap();
        let header = crate::formats::LightmapMeshHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.vertex_count, 4);
        assert_eq!(header.index_count, 6);
        assert_eq!(
            header.format,
            lightmap_common::FORMAT_UV | lightmap_common::FORMAT_COLOR
        );
    }

    #[test]
    fn test_per_mesh_output_names_stay_unique_and_local() {
        let dir = Path::new("out");
        let output = dir.join("level.lmmesh");
        let mut used = HashSet::new();

        let rock = per_mesh_output(&output, "Rock", &mut used);
        let rock_again = per_mesh_output(&output, "Rock", &mut used);
        let escaped = per_mesh_output(&output, "../../etc/passwd", &mut used);

        assert_eq!(rock, dir.join("level_Rock.lmmesh"));
        assert_eq!(rock_again, dir.join("level_Rock.001.lmmesh"));
        assert_eq!(escaped, dir.join("level_______etc_passwd.lmmesh"));
        assert_eq!(escaped.parent(), Some(dir));
    }

    #[test]
    fn test_encode_mesh_file_needs_primary_uv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tri.obj");
        std::fs::write(&input, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let err = encode_mesh_file(&input, &dir.path().join("tri.lmmesh"), &SmartProject::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "No regular UV map.");
    }
}
