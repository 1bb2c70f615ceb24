//! Toolpath primitives: closed polygons and open polylines.

use fdm_geom::Point2;

/// A 2D polygon (closed path). Winding direction distinguishes outer
/// boundaries (CCW) from holes (CW).
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Vertices of the polygon in order.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Check if the polygon is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Signed area of the polygon.
    /// Positive for counter-clockwise, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area / 2.0
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse the winding order.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Ensure counter-clockwise winding.
    pub fn ensure_ccw(&mut self) {
        if !self.is_ccw() {
            self.reverse();
        }
    }

    /// Ensure clockwise winding.
    pub fn ensure_cw(&mut self) {
        if self.is_ccw() {
            self.reverse();
        }
    }

    /// Perimeter length.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let mut length = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            length += (self.points[j] - self.points[i]).norm();
        }
        length
    }

    /// Compute centroid of the polygon (vertex average; sufficient for
    /// the rotation pivot used by infill generation).
    pub fn centroid(&self) -> Point2 {
        if self.points.is_empty() {
            return Point2::origin();
        }
        let sum: Point2 = self
            .points
            .iter()
            .fold(Point2::origin(), |acc, p| Point2::new(acc.x + p.x, acc.y + p.y));
        Point2::new(sum.x / self.points.len() as f64, sum.y / self.points.len() as f64)
    }

    /// Rotate the polygon by `angle` radians about `pivot`.
    pub fn rotated_about(&self, angle: f64, pivot: Point2) -> Self {
        let (s, c) = angle.sin_cos();
        let points = self
            .points
            .iter()
            .map(|p| {
                let dx = p.x - pivot.x;
                let dy = p.y - pivot.y;
                Point2::new(pivot.x + dx * c - dy * s, pivot.y + dx * s + dy * c)
            })
            .collect();
        Polygon::new(points)
    }

    /// Offset the polygon inward (shrink, positive distance) or outward
    /// (expand, negative distance) by `distance`, using a mitered-join
    /// bisector construction. `miter_limit` bounds how far a sharp
    /// corner's offset vertex may travel relative to `distance`, beyond
    /// which the corner is clamped rather than spiking out.
    pub fn offset(&self, distance: f64, miter_limit: f64) -> Option<Self> {
        if self.points.len() < 3 {
            return None;
        }

        let n = self.points.len();
        let mut offset_points = Vec::with_capacity(n);

        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;

            let p0 = self.points[prev];
            let p1 = self.points[i];
            let p2 = self.points[next];

            let e1 = (p1 - p0).normalize();
            let e2 = (p2 - p1).normalize();

            // Inward normals (rotate 90deg CCW for CCW polygon, CW for CW polygon).
            let sign = if self.is_ccw() { 1.0 } else { -1.0 };
            let n1 = Point2::new(-e1.y * sign, e1.x * sign);
            let n2 = Point2::new(-e2.y * sign, e2.x * sign);

            let bisector = (n1.coords + n2.coords).normalize();

            let dot = n1.coords.dot(&bisector);
            let offset_dist = if dot.abs() > 0.001 {
                distance / dot
            } else {
                distance
            };

            let max_offset = distance.abs() * miter_limit;
            let clamped_offset = offset_dist.clamp(-max_offset, max_offset);

            let offset_pt = Point2::new(
                p1.x + bisector.x * clamped_offset,
                p1.y + bisector.y * clamped_offset,
            );
            offset_points.push(offset_pt);
        }

        let result = Polygon::new(offset_points);
        if result.signed_area().abs() < 1e-10 {
            return None;
        }

        Some(result)
    }
}

/// An open polyline (non-closed path).
#[derive(Debug, Clone)]
pub struct Polyline {
    /// Points along the path.
    pub points: Vec<Point2>,
}

impl Polyline {
    /// Create a new polyline.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Total length of the polyline.
    pub fn length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Starting point.
    pub fn start(&self) -> Option<&Point2> {
        self.points.first()
    }

    /// Ending point.
    pub fn end(&self) -> Option<&Point2> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_area() {
        let square = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]);
        assert!((square.signed_area() - 1.0).abs() < 1e-10);
        assert!(square.is_ccw());
    }

    #[test]
    fn test_polygon_offset_inward() {
        let square = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ]);
        let offset = square.offset(1.0, 5.0).unwrap();
        let area = offset.signed_area().abs();
        assert!((area - 64.0).abs() < 1.0);
    }

    #[test]
    fn test_polygon_offset_outward() {
        let square = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ]);
        let offset = square.offset(-1.0, 10.0).unwrap();
        let area = offset.signed_area().abs();
        assert!(area > 100.0);
    }

    #[test]
    fn test_rotated_about_centroid_roundtrip() {
        let square = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ]);
        let centroid = square.centroid();
        let rotated = square.rotated_about(0.7, centroid);
        let back = rotated.rotated_about(-0.7, centroid);
        for (a, b) in square.points.iter().zip(back.points.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }
}
