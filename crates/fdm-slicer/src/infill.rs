//! InfillGenerator — parallel line families clipped to a region.

use fdm_geom::Point2;

use crate::path::{Polygon, Polyline};
use crate::perimeter::{associate_holes, point_in_polygon};
use crate::region::Region;

/// Settings for infill generation, scoped to a single layer.
#[derive(Debug, Clone)]
pub struct InfillSettings {
    /// Nozzle diameter `d` (mm).
    pub nozzle_diameter: f64,
    /// Whether this layer is forced solid (top/bottom layer).
    pub solid: bool,
    /// Fill angles (degrees); all are applied to every layer.
    pub fill_angles: Vec<f64>,
    /// Infill density, percent. May exceed 100.
    pub infill_density: f64,
    /// Fraction of nozzle diameter by which infill is expanded into walls.
    pub solid_overlap: f64,
}

/// Generate the infill line family for one layer's region.
///
/// For each outer boundary (with its associated holes), expands it
/// outward by `solid_overlap * d`, then for every fill angle rotates
/// the expanded boundary set about its centroid, sweeps vertical scan
/// lines spaced `d / f` apart across its bounding box (extended by
/// `4*d`), clips each to the boundary set, drops segments shorter than
/// `0.5*d`, and rotates survivors back. All angles' segments are
/// concatenated in the order produced — layers are not indexed into
/// `fill_angles`.
pub fn generate_infill(region: &Region, settings: &InfillSettings) -> Vec<Polyline> {
    if region.is_empty() || settings.fill_angles.is_empty() {
        return Vec::new();
    }

    let d = settings.nozzle_diameter;
    let f = if settings.solid {
        1.0
    } else {
        settings.infill_density / 100.0
    };
    if f <= 0.0 {
        return Vec::new();
    }
    let spacing = d / f;
    let min_length = 0.5 * d;
    let extension = 4.0 * d;

    // Offset distance shrinks a ring's own enclosed area when positive,
    // regardless of winding. Outer boundaries need to grow (negative
    // distance); holes need to shrink (positive distance) so the solid
    // expands into them the same way.
    let expand_by = settings.solid_overlap * d;
    let expanded: Vec<Polygon> = region
        .contours
        .iter()
        .map(|c| {
            let distance = if c.is_ccw() { -expand_by } else { expand_by };
            c.offset(distance, 10.0).unwrap_or_else(|| c.clone())
        })
        .collect();

    let associations = associate_holes(&region.contours);

    let mut paths = Vec::new();

    for (outer_idx, hole_indices) in associations {
        let outer = &expanded[outer_idx];
        let pivot = outer.centroid();
        let holes: Vec<&Polygon> = hole_indices.iter().map(|i| &expanded[*i]).collect();

        for &angle_deg in &settings.fill_angles {
            let angle = angle_deg.to_radians();

            let rotated_outer = outer.rotated_about(angle, pivot);
            let rotated_holes: Vec<Polygon> =
                holes.iter().map(|h| h.rotated_about(angle, pivot)).collect();

            let mut boundary_set = vec![rotated_outer];
            boundary_set.extend(rotated_holes);

            let (min, max) = compute_bounds(&boundary_set);
            let x_start = min[0] - extension;
            let x_end = max[0] + extension;

            let mut x = x_start;
            while x < x_end {
                let mut ys = find_vertical_intersections(x, &boundary_set);
                ys.sort_by(|a, b| a.partial_cmp(b).unwrap());

                for pair in ys.chunks(2) {
                    if pair.len() != 2 {
                        continue;
                    }
                    let (ya, yb) = (pair[0], pair[1]);
                    let mid = Point2::new(x, (ya + yb) / 2.0);
                    if !is_point_inside_boundaries(&mid, &boundary_set) {
                        continue;
                    }

                    let p0 = Point2::new(x, ya);
                    let p1 = Point2::new(x, yb);
                    if (p1 - p0).norm() < min_length {
                        continue;
                    }

                    let world0 = rotate_point(p0, -angle, pivot);
                    let world1 = rotate_point(p1, -angle, pivot);
                    paths.push(Polyline::new(vec![world0, world1]));
                }

                x += spacing;
            }
        }
    }

    paths
}

fn rotate_point(p: Point2, angle: f64, pivot: Point2) -> Point2 {
    let (s, c) = angle.sin_cos();
    let dx = p.x - pivot.x;
    let dy = p.y - pivot.y;
    Point2::new(pivot.x + dx * c - dy * s, pivot.y + dx * s + dy * c)
}

fn compute_bounds(polygons: &[Polygon]) -> ([f64; 2], [f64; 2]) {
    let mut min = [f64::MAX, f64::MAX];
    let mut max = [f64::MIN, f64::MIN];

    for poly in polygons {
        for pt in &poly.points {
            min[0] = min[0].min(pt.x);
            min[1] = min[1].min(pt.y);
            max[0] = max[0].max(pt.x);
            max[1] = max[1].max(pt.y);
        }
    }

    (min, max)
}

/// Intersections of the vertical line `x = x0` with every edge of every
/// boundary polygon, returned as `y` values.
fn find_vertical_intersections(x0: f64, boundaries: &[Polygon]) -> Vec<f64> {
    let mut ys = Vec::new();
    let eps = 1e-10;

    for poly in boundaries {
        let n = poly.points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let a = &poly.points[i];
            let b = &poly.points[j];

            let dx = b.x - a.x;
            if dx.abs() < eps {
                continue;
            }
            let t = (x0 - a.x) / dx;
            if (-eps..=1.0 + eps).contains(&t) {
                ys.push(a.y + t * (b.y - a.y));
            }
        }
    }

    ys
}

/// A point is inside the boundary region iff it falls inside at least
/// one outer (CCW) contour and outside every hole (CW) contour.
fn is_point_inside_boundaries(point: &Point2, boundaries: &[Polygon]) -> bool {
    let mut inside_outer = false;

    for poly in boundaries {
        let contains = point_in_polygon(point, poly);
        if poly.is_ccw() {
            if contains {
                inside_outer = true;
            }
        } else if contains {
            return false;
        }
    }

    inside_outer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::new(vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ])
    }

    #[test]
    fn test_sparse_infill_spacing_law() {
        let region = Region {
            contours: vec![square(0.0, 0.0, 20.0, 20.0)],
        };
        let settings = InfillSettings {
            nozzle_diameter: 0.4,
            solid: false,
            fill_angles: vec![0.0],
            infill_density: 20.0,
            solid_overlap: 0.0,
        };
        let paths = generate_infill(&region, &settings);
        assert!(!paths.is_empty());

        let expected_spacing = 0.4 / 0.2;
        let mut xs: Vec<f64> = paths.iter().map(|p| p.points[0].x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in xs.windows(2) {
            assert!((pair[1] - pair[0] - expected_spacing).abs() < 1e-6);
        }
    }

    #[test]
    fn test_infill_avoids_hole() {
        let mut hole = square(8.0, 8.0, 12.0, 12.0);
        hole.ensure_cw();
        let region = Region {
            contours: vec![square(0.0, 0.0, 20.0, 20.0), hole],
        };
        let settings = InfillSettings {
            nozzle_diameter: 0.4,
            solid: false,
            fill_angles: vec![0.0, 90.0],
            infill_density: 20.0,
            solid_overlap: 0.0,
        };
        let paths = generate_infill(&region, &settings);
        assert!(!paths.is_empty());
        for path in &paths {
            for pt in &path.points {
                assert!(!(pt.x > 8.5 && pt.x < 11.5 && pt.y > 8.5 && pt.y < 11.5));
            }
        }
    }

    #[test]
    fn test_solid_overlap_shrinks_holes_not_grows_them() {
        // With solid_overlap > 0, the hole boundary must shrink (letting
        // infill bond further into the wall around it), never grow.
        let mut hole = square(8.0, 8.0, 12.0, 12.0);
        hole.ensure_cw();
        let region = Region {
            contours: vec![square(0.0, 0.0, 20.0, 20.0), hole.clone()],
        };
        let settings = InfillSettings {
            nozzle_diameter: 0.4,
            solid: false,
            fill_angles: vec![0.0, 90.0],
            infill_density: 20.0,
            solid_overlap: 0.5,
        };
        let paths = generate_infill(&region, &settings);
        assert!(!paths.is_empty());
        // No path may ever cross into the (still-present) center of the
        // hole, shrunk or not.
        for path in &paths {
            for pt in &path.points {
                assert!(!(pt.x > 9.0 && pt.x < 11.0 && pt.y > 9.0 && pt.y < 11.0));
            }
        }

        assert!(!hole.is_ccw());
        let expand_by = settings.solid_overlap * settings.nozzle_diameter;
        let shrunk = hole.offset(expand_by, 10.0).unwrap();
        assert!(
            shrunk.area() < hole.area(),
            "positive offset distance on a hole contour must shrink it, not grow it"
        );
    }

    #[test]
    fn test_solid_layer_uses_full_density_spacing() {
        let region = Region {
            contours: vec![square(0.0, 0.0, 20.0, 20.0)],
        };
        let settings = InfillSettings {
            nozzle_diameter: 0.4,
            solid: true,
            fill_angles: vec![0.0],
            infill_density: 15.0,
            solid_overlap: 0.0,
        };
        let paths = generate_infill(&region, &settings);
        let mut xs: Vec<f64> = paths.iter().map(|p| p.points[0].x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in xs.windows(2) {
            assert!((pair[1] - pair[0] - 0.4).abs() < 1e-6);
        }
    }
}
