//! Mesh loading and conditioning.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SlicerError};

/// A triangulated surface as flat vertex/index buffers.
///
/// Mirrors the flat `[f32; 3*n]` layout the mesh-handling parts of this
/// pack use, rather than an indexed half-edge or B-rep structure — the
/// slicer only ever needs vertex positions and triangle windings.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Flattened `x, y, z` vertex coordinates.
    pub vertices: Vec<f32>,
    /// Triangle vertex indices, three per triangle.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounding box as `(min, max)`, or `None` if empty.
    pub fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for chunk in self.vertices.chunks_exact(3) {
            for axis in 0..3 {
                let v = chunk[axis] as f64;
                min[axis] = min[axis].min(v);
                max[axis] = max[axis].max(v);
            }
        }
        Some((min, max))
    }
}

/// Load and condition a triangulated surface from an STL file (binary or
/// ASCII, auto-detected).
///
/// Applies, in order: deduplication of coincident vertices, removal of
/// degenerate (zero-area) triangles, and hole-filling if the resulting
/// mesh is not watertight. Watertightness after repair is not required —
/// downstream slicing tolerates open edges by bridging gaps during
/// section polygonization.
pub fn load_stl(path: &Path) -> Result<Mesh> {
    let file = File::open(path)
        .map_err(|e| SlicerError::IOError(format!("cannot open {}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);

    let stl = stl_io::create_stl_reader(&mut reader)
        .map_err(|e| SlicerError::InvalidMesh(format!("cannot parse {}: {e}", path.display())))?;

    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for tri in stl {
        let tri = tri
            .map_err(|e| SlicerError::InvalidMesh(format!("malformed triangle: {e}")))?;
        for v in tri.vertices {
            vertices.push(v);
        }
        let base = (vertices.len() - 3) as u32;
        indices.push(base);
        indices.push(base + 1);
        indices.push(base + 2);
    }

    if indices.is_empty() {
        return Err(SlicerError::InvalidMesh("mesh contains zero triangles".into()));
    }

    let mesh = Mesh {
        vertices: vertices.into_iter().flatten().collect(),
        indices,
    };

    let mesh = dedup_vertices(mesh);
    let mesh = remove_degenerate_triangles(mesh);

    if mesh.triangle_count() == 0 {
        return Err(SlicerError::InvalidMesh(
            "mesh has zero triangles after removing degenerate geometry".into(),
        ));
    }

    let mesh = fill_holes(mesh);

    debug!(
        triangles = mesh.triangle_count(),
        vertices = mesh.vertices.len() / 3,
        "loaded mesh"
    );

    Ok(mesh)
}

/// Merge coincident vertices (exact match on a quantized key) and remap
/// triangle indices accordingly.
fn dedup_vertices(mesh: Mesh) -> Mesh {
    let mut map: HashMap<(i64, i64, i64), u32> = HashMap::new();
    let mut unique: Vec<f32> = Vec::new();
    let mut remap: Vec<u32> = Vec::with_capacity(mesh.vertices.len() / 3);

    const SCALE: f64 = 1.0e6;

    for chunk in mesh.vertices.chunks_exact(3) {
        let key = (
            (chunk[0] as f64 * SCALE).round() as i64,
            (chunk[1] as f64 * SCALE).round() as i64,
            (chunk[2] as f64 * SCALE).round() as i64,
        );
        let idx = *map.entry(key).or_insert_with(|| {
            let idx = (unique.len() / 3) as u32;
            unique.extend_from_slice(chunk);
            idx
        });
        remap.push(idx);
    }

    let indices = mesh.indices.iter().map(|&i| remap[i as usize]).collect();

    Mesh {
        vertices: unique,
        indices,
    }
}

/// Drop triangles whose area is (numerically) zero.
fn remove_degenerate_triangles(mesh: Mesh) -> Mesh {
    let mut indices = Vec::with_capacity(mesh.indices.len());
    for tri in mesh.indices.chunks_exact(3) {
        let v = |i: u32| -> [f64; 3] {
            let base = i as usize * 3;
            [
                mesh.vertices[base] as f64,
                mesh.vertices[base + 1] as f64,
                mesh.vertices[base + 2] as f64,
            ]
        };
        let a = v(tri[0]);
        let b = v(tri[1]);
        let c = v(tri[2]);
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let cross = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        let area_sq = cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2];
        if area_sq > 1e-20 {
            indices.extend_from_slice(tri);
        }
    }
    Mesh {
        vertices: mesh.vertices,
        indices,
    }
}

/// Close simple boundary loops by fan-triangulating from their first
/// vertex. This is a conservative repair: it only stitches edges that
/// belong to exactly one triangle (open boundary edges); it does not
/// attempt to resolve non-manifold topology. Non-watertight meshes that
/// cannot be fully closed this way are passed through unchanged — the
/// slicer tolerates the remaining gaps at section time.
fn fill_holes(mesh: Mesh) -> Mesh {
    let mut edge_count: HashMap<(u32, u32), i32> = HashMap::new();
    for tri in mesh.indices.chunks_exact(3) {
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            *edge_count.entry(key).or_insert(0) += 1;
        }
    }

    let mut boundary_edges: Vec<(u32, u32)> = Vec::new();
    for tri in mesh.indices.chunks_exact(3) {
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            if edge_count.get(&key) == Some(&1) {
                boundary_edges.push((a, b));
            }
        }
    }

    if boundary_edges.is_empty() {
        return mesh;
    }

    // Chain boundary edges into loops, then fan-triangulate each loop.
    let mut adjacency: HashMap<u32, u32> = boundary_edges.iter().cloned().collect();
    let mut extra_indices = Vec::new();

    while let Some((&start, _)) = adjacency.iter().next() {
        let mut loop_verts = vec![start];
        let mut current = start;
        loop {
            let Some(&next) = adjacency.get(&current) else {
                break;
            };
            adjacency.remove(&current);
            if next == start {
                break;
            }
            loop_verts.push(next);
            current = next;
        }

        if loop_verts.len() >= 3 {
            let anchor = loop_verts[0];
            for i in 1..loop_verts.len() - 1 {
                extra_indices.push(anchor);
                extra_indices.push(loop_verts[i]);
                extra_indices.push(loop_verts[i + 1]);
            }
        }
    }

    let mut indices = mesh.indices;
    indices.extend(extra_indices);

    Mesh {
        vertices: mesh.vertices,
        indices,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn cube_mesh(size: f32) -> Mesh {
        let vertices = vec![
            0.0, 0.0, 0.0, size, 0.0, 0.0, size, size, 0.0, 0.0, size, 0.0, 0.0, 0.0, size, size,
            0.0, size, size, size, size, 0.0, size, size,
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, 4, 5, 6, 4, 6, 7, 0, 1, 5, 0, 5, 4, 2, 3, 7, 2, 7, 6, 0, 4, 7, 0, 7,
            3, 1, 2, 6, 1, 6, 5,
        ];
        Mesh { vertices, indices }
    }

    #[test]
    fn test_bounds() {
        let mesh = cube_mesh(10.0);
        let (min, max) = mesh.bounds().unwrap();
        assert!((min[0]).abs() < 1e-6);
        assert!((max[2] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_dedup_vertices_merges_shared_corners() {
        let mesh = cube_mesh(10.0);
        let deduped = dedup_vertices(mesh.clone());
        assert!(deduped.vertices.len() <= mesh.vertices.len());
        assert_eq!(deduped.indices.len(), mesh.indices.len());
    }

    #[test]
    fn test_remove_degenerate_triangles_drops_zero_area() {
        let mut mesh = cube_mesh(10.0);
        // Append a degenerate (zero-area) triangle referencing one point thrice.
        mesh.indices.extend_from_slice(&[0, 0, 0]);
        let cleaned = remove_degenerate_triangles(mesh);
        assert_eq!(cleaned.triangle_count(), 12);
    }

    #[test]
    fn test_fill_holes_noop_on_watertight_mesh() {
        let mesh = cube_mesh(10.0);
        let filled = fill_holes(mesh.clone());
        assert_eq!(filled.triangle_count(), mesh.triangle_count());
    }
}
