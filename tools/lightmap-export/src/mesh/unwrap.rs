//! Automatic UV unwrapping for the lightmap channel
//!
//! [`SmartProject`] groups edge-connected faces whose normals stay within an
//! angle limit of the island's first face, projects each island onto the
//! plane of its averaged normal, and shelf-packs the islands into the unit
//! square. Seams only appear where the surface bends past the limit.

use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use std::collections::VecDeque;

use super::Mesh;

/// Writes UVs into one layer of a mesh
pub trait UvUnwrapper {
    /// Fill UV layer `channel` for every corner. Returns false on failure.
    fn apply(&self, mesh: &mut Mesh, channel: usize) -> bool;
}

/// Angle-limited planar projection with shelf packing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmartProject {
    /// Maximum angle in degrees between a face and its island's seed face
    pub angle_limit: f32,
    /// Gap between islands, as a fraction of the packed square
    pub island_margin: f32,
}

impl Default for SmartProject {
    fn default() -> Self {
        Self {
            angle_limit: 66.0,
            island_margin: 0.02,
        }
    }
}

struct Island {
    faces: Vec<usize>,
    /// Projected coordinates, parallel to the corners of `faces`
    coords: Vec<Vec2>,
    min: Vec2,
    size: Vec2,
}

impl UvUnwrapper for SmartProject {
    fn apply(&self, mesh: &mut Mesh, channel: usize) -> bool {
        if channel >= mesh.uv_layers.len() {
            return false;
        }
        if mesh.faces.is_empty() {
            return true;
        }

        let area_normals: Vec<Vec3> = (0..mesh.faces.len())
            .map(|f| newell_normal(mesh, f))
            .collect();
        let unit_normals: Vec<Vec3> = area_normals
            .iter()
            .map(|n| {
                let n = n.normalize_or_zero();
                if n == Vec3::ZERO { Vec3::Z } else { n }
            })
            .collect();

        let adjacency = face_adjacency(mesh);
        let cos_limit = self.angle_limit.to_radians().cos();
        let mut islands = Vec::new();
        let mut visited = vec![false; mesh.faces.len()];

        for seed in 0..mesh.faces.len() {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;
            let seed_normal = unit_normals[seed];
            let mut faces = Vec::new();
            let mut queue = VecDeque::from([seed]);

            while let Some(face) = queue.pop_front() {
                faces.push(face);
                for &neighbor in &adjacency[face] {
                    if !visited[neighbor] && unit_normals[neighbor].dot(seed_normal) >= cos_limit {
                        visited[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                }
            }

            let axis = faces
                .iter()
                .map(|&f| area_normals[f])
                .sum::<Vec3>()
                .normalize_or_zero();
            let axis = if axis == Vec3::ZERO { seed_normal } else { axis };
            islands.push(project_island(mesh, faces, axis));
        }

        let placements = self.pack(&islands);
        let layer = &mut mesh.uv_layers[channel].data;
        for (island, (offset, scale)) in islands.iter().zip(placements) {
            let mut coords = island.coords.iter();
            for &face in &island.faces {
                for corner in mesh.faces[face].corners() {
                    let Some(&p) = coords.next() else {
                        return false;
                    };
                    let uv = (offset + (p - island.min)) * scale;
                    layer[corner] = [uv.x.clamp(0.0, 1.0), uv.y.clamp(0.0, 1.0)];
                }
            }
        }

        tracing::debug!(
            "Smart project: {} faces -> {} islands",
            mesh.faces.len(),
            islands.len()
        );
        true
    }
}

impl SmartProject {
    /// Shelf-pack islands tallest first. Returns (offset, scale) per island
    /// so that `(offset + local) * scale` lands in the unit square.
    fn pack(&self, islands: &[Island]) -> Vec<(Vec2, f32)> {
        let content_area: f32 = islands.iter().map(|i| i.size.x * i.size.y).sum();
        let widest = islands.iter().map(|i| i.size.x).fold(0.0f32, f32::max);
        let margin = self.island_margin.max(0.0) * content_area.sqrt().max(widest);

        let padded_area: f32 = islands
            .iter()
            .map(|i| (i.size.x + margin) * (i.size.y + margin))
            .sum();
        let row_width = padded_area.sqrt().max(widest + margin);

        let mut order: Vec<usize> = (0..islands.len()).collect();
        order.sort_by(|&a, &b| islands[b].size.y.total_cmp(&islands[a].size.y));

        let mut offsets = vec![Vec2::ZERO; islands.len()];
        let mut cursor = Vec2::ZERO;
        let mut shelf_height = 0.0f32;
        let mut used = Vec2::ZERO;

        for idx in order {
            let cell = islands[idx].size + Vec2::splat(margin);
            if cursor.x > 0.0 && cursor.x + cell.x > row_width {
                cursor = Vec2::new(0.0, cursor.y + shelf_height);
                shelf_height = 0.0;
            }
            offsets[idx] = cursor + Vec2::splat(margin * 0.5);
            cursor.x += cell.x;
            shelf_height = shelf_height.max(cell.y);
            used = used.max(Vec2::new(cursor.x, cursor.y + shelf_height));
        }

        let extent = used.x.max(used.y);
        let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };
        offsets.into_iter().map(|o| (o, scale)).collect()
    }
}

/// Area-weighted face normal (length is twice the polygon area)
fn newell_normal(mesh: &Mesh, face: usize) -> Vec3 {
    let corners = mesh.faces[face].corners();
    let mut normal = Vec3::ZERO;
    for corner in corners.clone() {
        let next = if corner + 1 == corners.end {
            corners.start
        } else {
            corner + 1
        };
        let p = Vec3::from(mesh.positions[mesh.loops[corner] as usize]);
        let q = Vec3::from(mesh.positions[mesh.loops[next] as usize]);
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal
}

/// Faces sharing an edge (by vertex index)
fn face_adjacency(mesh: &Mesh) -> Vec<Vec<usize>> {
    let mut edges: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (f, face) in mesh.faces.iter().enumerate() {
        let corners = face.corners();
        for corner in corners.clone() {
            let next = if corner + 1 == corners.end {
                corners.start
            } else {
                corner + 1
            };
            let (a, b) = (mesh.loops[corner], mesh.loops[next]);
            let key = if a < b { (a, b) } else { (b, a) };
            edges.entry(key).or_default().push(f);
        }
    }

    let mut adjacency = vec![Vec::new(); mesh.faces.len()];
    for faces in edges.values() {
        for &a in faces {
            for &b in faces {
                if a != b && !adjacency[a].contains(&b) {
                    adjacency[a].push(b);
                }
            }
        }
    }
    adjacency
}

fn project_island(mesh: &Mesh, faces: Vec<usize>, axis: Vec3) -> Island {
    let helper = if axis.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
    let u_axis = helper.cross(axis).normalize();
    let v_axis = axis.cross(u_axis);

    let mut coords = Vec::new();
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for &face in &faces {
        for corner in mesh.faces[face].corners() {
            let p = Vec3::from(mesh.positions[mesh.loops[corner] as usize]);
            let uv = Vec2::new(p.dot(u_axis), p.dot(v_axis));
            min = min.min(uv);
            max = max.max(uv);
            coords.push(uv);
        }
    }

    Island {
        faces,
        coords,
        min,
        size: (max - min).max(Vec2::splat(1e-6)),
    }
}
