//! Mesh slicing — intersect the mesh with a stack of horizontal planes.

use rayon::prelude::*;

use fdm_geom::Point2;

use crate::error::{Result, SlicerError};
use crate::mesh::Mesh;

/// A single candidate layer's raw intersection with the mesh: an
/// unordered collection of 2D line segments. Ring grouping and polygon
/// repair are the region builder's job, not the slicer's.
#[derive(Debug, Clone)]
pub struct Section {
    /// Z height of this candidate layer (mm).
    pub z: f64,
    /// Pre-skip layer index `k`.
    pub index: usize,
    /// Raw 2D segments from triangle/plane intersection. Empty when the
    /// plane does not cross the mesh at this height.
    pub segments: Vec<(Point2, Point2)>,
}

impl Section {
    /// Whether this section produced no material at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Number of candidate layers `N = ceil((z_max - z_min) / h)`, at least 1
/// for any mesh with positive extent.
pub fn layer_count(z_min: f64, z_max: f64, layer_height: f64) -> usize {
    if z_max <= z_min {
        return 0;
    }
    ((z_max - z_min) / layer_height).ceil().max(1.0) as usize
}

/// Candidate layer heights `z_k = z_min + k * h` for `k in [0, N)`.
pub fn layer_heights(z_min: f64, z_max: f64, layer_height: f64) -> Vec<f64> {
    let n = layer_count(z_min, z_max, layer_height);
    (0..n).map(|k| z_min + k as f64 * layer_height).collect()
}

/// A layer is solid iff it is among the first `bottom_layers` or the
/// last `top_layers`, counted by the *pre-skip* index `k` against the
/// full candidate count `n`.
pub fn is_solid(k: usize, n: usize, bottom_layers: usize, top_layers: usize) -> bool {
    k < bottom_layers || k + top_layers >= n
}

/// A triangle with its vertices and bounding Z range, used to cull
/// triangles that cannot intersect a given plane before testing edges.
#[derive(Debug, Clone, Copy)]
struct Triangle {
    v0: [f64; 3],
    v1: [f64; 3],
    v2: [f64; 3],
    z_min: f64,
    z_max: f64,
}

fn extract_triangles(mesh: &Mesh) -> Vec<Triangle> {
    let num_triangles = mesh.triangle_count();
    let mut triangles = Vec::with_capacity(num_triangles);

    let v = |idx: usize| -> [f64; 3] {
        [
            mesh.vertices[idx * 3] as f64,
            mesh.vertices[idx * 3 + 1] as f64,
            mesh.vertices[idx * 3 + 2] as f64,
        ]
    };

    for i in 0..num_triangles {
        let i0 = mesh.indices[i * 3] as usize;
        let i1 = mesh.indices[i * 3 + 1] as usize;
        let i2 = mesh.indices[i * 3 + 2] as usize;

        let v0 = v(i0);
        let v1 = v(i1);
        let v2 = v(i2);

        let z_min = v0[2].min(v1[2]).min(v2[2]);
        let z_max = v0[2].max(v1[2]).max(v2[2]);

        triangles.push(Triangle {
            v0,
            v1,
            v2,
            z_min,
            z_max,
        });
    }

    triangles
}

/// Intersect a triangle with a horizontal plane at `z`, returning the
/// 2D segment (projected to XY) if one exists.
fn triangle_plane_intersection(tri: &Triangle, z: f64) -> Option<([f64; 2], [f64; 2])> {
    let eps = 1e-10;

    let d0 = tri.v0[2] - z;
    let d1 = tri.v1[2] - z;
    let d2 = tri.v2[2] - z;

    let above = |d: f64| d > eps;
    let below = |d: f64| d < -eps;

    if (above(d0) && above(d1) && above(d2)) || (below(d0) && below(d1) && below(d2)) {
        return None;
    }

    let mut points: Vec<[f64; 2]> = Vec::with_capacity(2);
    let edges = [
        (tri.v0, tri.v1, d0, d1),
        (tri.v1, tri.v2, d1, d2),
        (tri.v2, tri.v0, d2, d0),
    ];

    for (va, vb, da, db) in edges {
        if (da > eps && db < -eps) || (da < -eps && db > eps) {
            let t = da / (da - db);
            let x = va[0] + t * (vb[0] - va[0]);
            let y = va[1] + t * (vb[1] - va[1]);
            points.push([x, y]);
        } else if da.abs() <= eps && db.abs() > eps {
            points.push([va[0], va[1]]);
        } else if db.abs() <= eps && da.abs() > eps {
            points.push([vb[0], vb[1]]);
        }
    }

    points.dedup_by(|a, b| {
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        (dx * dx + dy * dy) < eps * eps
    });

    if points.len() >= 2 {
        Some((points[0], points[1]))
    } else {
        None
    }
}

fn slice_at_z(triangles: &[Triangle], z: f64, index: usize) -> Section {
    let mut segments = Vec::new();

    for tri in triangles {
        if tri.z_max < z || tri.z_min > z {
            continue;
        }
        if let Some((a, b)) = triangle_plane_intersection(tri, z) {
            segments.push((Point2::new(a[0], a[1]), Point2::new(b[0], b[1])));
        }
    }

    Section { z, index, segments }
}

/// Slice a mesh at the given candidate heights, one [`Section`] per
/// height, computed independently and in parallel.
pub fn slice_mesh(mesh: &Mesh, heights: &[f64]) -> Result<Vec<Section>> {
    if mesh.triangle_count() == 0 {
        return Err(SlicerError::InvalidMesh("mesh is empty".into()));
    }

    let triangles = extract_triangles(mesh);

    let sections: Vec<Section> = heights
        .par_iter()
        .enumerate()
        .map(|(idx, &z)| slice_at_z(&triangles, z, idx))
        .collect();

    Ok(sections)
}
