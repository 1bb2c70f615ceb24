//! PerimeterGenerator — concentric wall loops from a region.

use fdm_geom::Point2;

use crate::path::Polygon;
use crate::region::Region;

/// Settings for perimeter generation.
#[derive(Debug, Clone, Copy)]
pub struct PerimeterSettings {
    /// Nozzle diameter `d` (mm).
    pub nozzle_diameter: f64,
    /// Number of concentric perimeter walls `P`.
    pub perimeters: u32,
}

/// Generate concentric wall loops for one layer's region.
///
/// Produces `P` offsets linearly spaced over `[0, 0.7*d]` inclusive.
/// Offset `i` shrinks every outer boundary of the region (mitered, miter
/// limit 5) by `offsets[i]`; sub-polygons below area `(0.5*d)^2` are
/// discarded. Interior holes are never walled on their own, matching
/// the reference behavior. Offsets are ordered outermost (0) to
/// innermost (`0.7*d`); within one offset, polygons are ordered
/// lexicographically by centroid for determinism.
pub fn generate_perimeters(region: &Region, settings: &PerimeterSettings) -> Vec<Polygon> {
    let d = settings.nozzle_diameter;
    let p = settings.perimeters.max(1);
    let offsets = linspace(0.0, 0.7 * d, p);
    let min_area = (0.5 * d).powi(2);

    let outers: Vec<&Polygon> = region.contours.iter().filter(|c| c.is_ccw()).collect();

    let mut walls = Vec::new();
    for offset in offsets {
        let mut group: Vec<Polygon> = Vec::new();
        for outer in &outers {
            if let Some(shrunk) = outer.offset(offset, 5.0) {
                if shrunk.area() >= min_area {
                    group.push(shrunk);
                }
            }
        }
        group.sort_by(|a, b| centroid_key(a).partial_cmp(&centroid_key(b)).unwrap());
        walls.extend(group);
    }

    walls
}

fn centroid_key(p: &Polygon) -> (f64, f64) {
    let c = p.centroid();
    (c.x, c.y)
}

/// Evenly spaced values from `start` to `end` inclusive, matching
/// `numpy.linspace` semantics (a single-count request yields `start`).
fn linspace(start: f64, end: f64, count: u32) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Classify contours into outer boundaries and holes by winding.
pub fn classify_contours(contours: &[Polygon]) -> (Vec<&Polygon>, Vec<&Polygon>) {
    let mut outers = Vec::new();
    let mut holes = Vec::new();

    for contour in contours {
        if contour.is_ccw() {
            outers.push(contour);
        } else {
            holes.push(contour);
        }
    }

    (outers, holes)
}

/// Ray-casting point-in-polygon test (2D).
pub fn point_in_polygon(point: &Point2, polygon: &Polygon) -> bool {
    let n = polygon.points.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let pi = &polygon.points[i];
        let pj = &polygon.points[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Associate each hole with its containing outer boundary, by the
/// hole's first vertex falling inside that outer ring.
///
/// Returns `(outer_index, hole_indices)` pairs indexed into `contours`.
pub fn associate_holes(contours: &[Polygon]) -> Vec<(usize, Vec<usize>)> {
    let outer_indices: Vec<usize> = contours
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_ccw())
        .map(|(i, _)| i)
        .collect();

    let hole_indices: Vec<usize> = contours
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_ccw())
        .map(|(i, _)| i)
        .collect();

    let mut associations: Vec<(usize, Vec<usize>)> = Vec::new();

    for &outer_idx in &outer_indices {
        let outer = &contours[outer_idx];
        let mut contained_holes = Vec::new();

        for &hole_idx in &hole_indices {
            let hole = &contours[hole_idx];
            if let Some(pt) = hole.points.first() {
                if point_in_polygon(pt, outer) {
                    contained_holes.push(hole_idx);
                }
            }
        }

        associations.push((outer_idx, contained_holes));
    }

    associations
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
    fn test_point_in_polygon() {
        let square = square(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_polygon(&Point2::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(&Point2::new(15.0, 5.0), &square));
        assert!(!point_in_polygon(&Point2::new(-1.0, 5.0), &square));
    }

    #[test]
    fn test_classify_contours() {
        let outer = square(0.0, 0.0, 10.0, 10.0);
        let mut hole = square(2.0, 2.0, 8.0, 8.0);
        hole.ensure_cw();

        let contours = vec![outer, hole];
        let (outers, holes) = classify_contours(&contours);

        assert_eq!(outers.len(), 1);
        assert_eq!(holes.len(), 1);
    }

    #[test]
    fn test_linspace_single_perimeter_is_zero_offset() {
        let offsets = linspace(0.0, 0.7 * 0.4, 1);
        assert_eq!(offsets, vec![0.0]);
    }

    #[test]
    fn test_linspace_endpoints() {
        let offsets = linspace(0.0, 0.28, 4);
        assert_eq!(offsets.len(), 4);
        assert!((offsets[0] - 0.0).abs() < 1e-12);
        assert!((offsets[3] - 0.28).abs() < 1e-9);
    }

    #[test]
    fn test_generate_perimeters_single_wall_matches_outline() {
        let region = Region {
            contours: vec![square(0.0, 0.0, 10.0, 10.0)],
        };
        let settings = PerimeterSettings {
            nozzle_diameter: 0.4,
            perimeters: 1,
        };
        let walls = generate_perimeters(&region, &settings);
        assert_eq!(walls.len(), 1);
        assert!((walls[0].area() - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_generate_perimeters_skips_holes() {
        let mut hole = square(2.0, 2.0, 8.0, 8.0);
        hole.ensure_cw();
        let region = Region {
            contours: vec![square(0.0, 0.0, 10.0, 10.0), hole],
        };
        let settings = PerimeterSettings {
            nozzle_diameter: 0.4,
            perimeters: 2,
        };
        let walls = generate_perimeters(&region, &settings);
        // Two offsets x one outer boundary = two walls, never one per hole.
        assert_eq!(walls.len(), 2);
    }
}
