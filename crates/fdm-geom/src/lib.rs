#![warn(missing_docs)]

//! Point and vector types shared across the slicer pipeline.
//!
//! Thin wrappers around nalgebra — the slicer works almost entirely in
//! the XY plane, with Z appearing only as a layer height.

use nalgebra::{Vector2, Vector3};

/// A point in 3D space (mesh vertex space, mm).
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in the 2D plane of a single layer (mm).
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in the 2D plane of a single layer.
pub type Vec2 = Vector2<f64>;
