//! RegionBuilder — turns one section's raw segments into a clean,
//! offset-compensated polygonal region.

use geo::{BooleanOps, Coord, LineString, MultiPolygon as GeoMultiPolygon, Polygon as GeoPolygon, Simplify};

use fdm_geom::Point2;

use crate::config::Config;
use crate::error::Result;
use crate::path::Polygon;
use crate::perimeter::associate_holes;

/// A validated polygonal region for one layer: a flat list of contours,
/// outer boundaries wound CCW and holes wound CW, whose union is the
/// layer's material area.
#[derive(Debug, Clone, Default)]
pub struct Region {
    /// Outer boundaries and holes, flattened.
    pub contours: Vec<Polygon>,
}

impl Region {
    /// A region with no material.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// Build a [`Region`] from one section's raw line segments.
///
/// 1. Group segments into closed rings (dropping rings with fewer than
///    3 vertices).
/// 2. Repair self-intersections per ring via a boolean self-union.
/// 3. Apply the outward `xy_compensation` offset (mitered, miter limit
///    10) to each resulting simple polygon.
/// 4. Simplify with Douglas-Peucker at `simplify_tolerance`.
/// 5. Discard polygons with area at or below `small_feature`.
/// 6. Union the survivors, pairing holes with their containing outer
///    boundary, into the final region.
pub fn build_region(segments: Vec<(Point2, Point2)>, cfg: &Config) -> Result<Region> {
    let rings = chain_segments(segments);
    if rings.is_empty() {
        return Ok(Region::default());
    }

    let mut survivors: Vec<Polygon> = Vec::new();

    for ring in rings {
        for repaired in repair_self_intersections(&ring) {
            // xy_compensation expands the printed solid outward: an outer
            // (CCW) ring grows with a negative offset distance, a hole
            // (CW) ring shrinks (grows the solid into it) with a positive
            // one — offset's sign is winding-normalized, not area-normalized.
            let distance = if repaired.is_ccw() {
                -cfg.xy_compensation
            } else {
                cfg.xy_compensation
            };
            let compensated = repaired.offset(distance, 10.0).unwrap_or(repaired);
            let simplified = simplify_polygon(&compensated, cfg.simplify_tolerance);
            if simplified.len() >= 3 && simplified.area() > cfg.small_feature {
                survivors.push(simplified);
            }
        }
    }

    if survivors.is_empty() {
        return Ok(Region::default());
    }

    let contours = union_contours(&survivors)?;
    Ok(Region { contours })
}

/// Chain an unordered set of 2D segments into closed polygon rings,
/// greedily extending each chain until no further segment connects to
/// either end. Rings are returned sorted by descending absolute area so
/// that (by convention) the outermost ring of a component appears first.
fn chain_segments(segments: Vec<(Point2, Point2)>) -> Vec<Polygon> {
    if segments.is_empty() {
        return Vec::new();
    }

    let eps = 1e-6;
    let mut remaining = segments;
    let mut contours: Vec<Polygon> = Vec::new();

    while !remaining.is_empty() {
        let (start, end) = remaining.remove(0);
        let mut chain = vec![start, end];

        let mut changed = true;
        while changed {
            changed = false;
            let chain_start = *chain.first().unwrap();
            let chain_end = *chain.last().unwrap();

            let mut i = 0;
            while i < remaining.len() {
                let (a, b) = remaining[i];

                if (b - chain_end).norm() < eps {
                    chain.push(a);
                    remaining.remove(i);
                    changed = true;
                } else if (a - chain_end).norm() < eps {
                    chain.push(b);
                    remaining.remove(i);
                    changed = true;
                } else if (b - chain_start).norm() < eps {
                    chain.insert(0, a);
                    remaining.remove(i);
                    changed = true;
                } else if (a - chain_start).norm() < eps {
                    chain.insert(0, b);
                    remaining.remove(i);
                    changed = true;
                } else {
                    i += 1;
                }
            }
        }

        if chain.len() >= 3 {
            let dist = (chain.first().unwrap() - chain.last().unwrap()).norm();
            if dist < eps {
                chain.pop();
            }
            if chain.len() >= 3 {
                contours.push(Polygon::new(chain));
            }
        }
    }

    contours.sort_by(|a, b| b.area().partial_cmp(&a.area()).unwrap());

    contours
}

/// Repair a possibly self-intersecting ring by self-unioning it through
/// the boolean engine — the standard "buffer by zero" validity fix. A
/// self-intersecting input can split into several simple polygons; each
/// is returned with its own exterior ring (original winding restored).
///
/// A ring that collapses entirely (degenerate/near-zero-area input, which
/// real STL meshes produce routinely) yields an empty result rather than
/// an error — per-ring defects are dropped silently, not escalated to a
/// job-wide failure.
fn repair_self_intersections(ring: &Polygon) -> Vec<Polygon> {
    let was_ccw = ring.is_ccw();
    let geo_poly = to_geo_polygon(ring, &[]);
    let single = GeoMultiPolygon(vec![geo_poly.clone()]);
    let repaired = single.union(&GeoMultiPolygon(vec![geo_poly]));

    let mut out = Vec::with_capacity(repaired.0.len());
    for poly in repaired.0 {
        let mut fixed = from_geo_linestring(poly.exterior());
        if fixed.len() < 3 {
            continue;
        }
        if fixed.is_ccw() != was_ccw {
            fixed.reverse();
        }
        out.push(fixed);
    }

    out
}

/// Douglas-Peucker simplification of a polygon's exterior ring.
fn simplify_polygon(poly: &Polygon, tolerance: f64) -> Polygon {
    if tolerance <= 0.0 {
        return poly.clone();
    }
    let ls = to_geo_linestring(poly);
    let simplified = ls.simplify(&tolerance);
    from_geo_linestring(&simplified)
}

/// Pair holes with their containing outer boundary and union everything
/// into the region's final flat contour list.
fn union_contours(survivors: &[Polygon]) -> Result<Vec<Polygon>> {
    let associations = associate_holes(survivors);

    let mut geo_polys: Vec<GeoPolygon<f64>> = Vec::with_capacity(associations.len());
    for (outer_idx, hole_indices) in &associations {
        let holes: Vec<LineString<f64>> = hole_indices
            .iter()
            .map(|&i| to_geo_linestring(&survivors[i]))
            .collect();
        geo_polys.push(to_geo_polygon(&survivors[*outer_idx], &holes));
    }

    if geo_polys.is_empty() {
        return Ok(Vec::new());
    }

    let mut unioned = GeoMultiPolygon(vec![geo_polys[0].clone()]);
    for poly in &geo_polys[1..] {
        unioned = unioned.union(&GeoMultiPolygon(vec![poly.clone()]));
    }

    let mut contours = Vec::new();
    for poly in unioned.0 {
        let mut exterior = from_geo_linestring(poly.exterior());
        exterior.ensure_ccw();
        if exterior.area() > 0.0 {
            contours.push(exterior);
        }
        for interior in poly.interiors() {
            let mut hole = from_geo_linestring(interior);
            hole.ensure_cw();
            if hole.area() > 0.0 {
                contours.push(hole);
            }
        }
    }

    Ok(contours)
}

fn to_geo_linestring(poly: &Polygon) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = poly
        .points
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    LineString::new(coords)
}

fn to_geo_polygon(poly: &Polygon, holes: &[LineString<f64>]) -> GeoPolygon<f64> {
    GeoPolygon::new(to_geo_linestring(poly), holes.to_vec())
}

fn from_geo_linestring(ls: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point2> = ls.coords().map(|c| Point2::new(c.x, c.y)).collect();
    if points.len() >= 2 {
        let first = points[0];
        let last = *points.last().unwrap();
        if (first - last).norm() < 1e-9 {
            points.pop();
        }
    }
    Polygon::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<(Point2, Point2)> {
        let p = |x: f64, y: f64| Point2::new(x, y);
        vec![
            (p(x0, y0), p(x1, y0)),
            (p(x1, y0), p(x1, y1)),
            (p(x1, y1), p(x0, y1)),
            (p(x0, y1), p(x0, y0)),
        ]
    }

    #[test]
    fn test_build_region_single_square() {
        let cfg = Config {
            xy_compensation: 0.0,
            simplify_tolerance: 0.0,
            small_feature: 0.0,
            ..Config::default()
        };
        let region = build_region(square(0.0, 0.0, 10.0, 10.0), &cfg).unwrap();
        assert_eq!(region.contours.len(), 1);
        assert!((region.contours[0].area() - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_build_region_empty_segments_yields_empty_region() {
        let cfg = Config::default();
        let region = build_region(Vec::new(), &cfg).unwrap();
        assert!(region.is_empty());
    }

    #[test]
    fn test_small_feature_discards_tiny_ring() {
        let cfg = Config {
            xy_compensation: 0.0,
            simplify_tolerance: 0.0,
            small_feature: 1.0,
            ..Config::default()
        };
        let region = build_region(square(0.0, 0.0, 0.5, 0.5), &cfg).unwrap();
        assert!(region.is_empty());
    }

    #[test]
    fn test_collapsed_ring_is_dropped_not_fatal() {
        // A degenerate, zero-area ring (all points collinear) self-unions
        // to nothing. It must be skipped, not abort the whole layer.
        let degenerate = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]);
        let repaired = repair_self_intersections(&degenerate);
        assert!(repaired.is_empty());

        let mut segments = square(0.0, 0.0, 10.0, 10.0);
        segments.extend(vec![
            (Point2::new(20.0, 0.0), Point2::new(21.0, 0.0)),
            (Point2::new(21.0, 0.0), Point2::new(22.0, 0.0)),
            (Point2::new(22.0, 0.0), Point2::new(20.0, 0.0)),
        ]);
        let cfg = Config {
            xy_compensation: 0.0,
            simplify_tolerance: 0.0,
            small_feature: 0.0,
            ..Config::default()
        };
        let region = build_region(segments, &cfg).unwrap();
        assert_eq!(region.contours.len(), 1);
        assert!((region.contours[0].area() - 100.0).abs() < 1.0);
    }
}
