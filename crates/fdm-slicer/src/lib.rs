#![warn(missing_docs)]

//! The slicer engine: MeshLoader → Slicer → RegionBuilder →
//! {PerimeterGenerator, InfillGenerator}.
//!
//! G-code serialization lives in `fdm-gcode`, one layer up — this crate
//! only produces the ordered per-layer geometry.

pub mod config;
pub mod error;
pub mod infill;
pub mod mesh;
pub mod path;
pub mod perimeter;
pub mod region;
pub mod slice;

pub use config::Config;
pub use error::{Result, SlicerError};
pub use infill::{generate_infill, InfillSettings};
pub use mesh::{load_stl, Mesh};
pub use path::{Polygon, Polyline};
pub use perimeter::{generate_perimeters, PerimeterSettings};
pub use region::{build_region, Region};
pub use slice::{is_solid, layer_count, layer_heights, slice_mesh, Section};

use std::path::Path;

use tracing::{debug, info};

/// One fully-built layer: geometry only, ready for G-code emission.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Nominal bottom-of-layer height (mm).
    pub z: f64,
    /// Whether this layer was classified solid.
    pub solid: bool,
    /// Outer-to-inner wall loops.
    pub walls: Vec<Polygon>,
    /// Infill paths, in the order produced (by fill angle, then scan-line
    /// position).
    pub infill: Vec<Polyline>,
}

/// Run the full MeshLoader → Slicer → RegionBuilder →
/// {PerimeterGenerator, InfillGenerator} pipeline over one STL file.
///
/// Layers with an empty section (no triangle-plane intersection) or an
/// empty region after cleanup are silently dropped, not emitted as
/// empty layers — matching the writer's "skip the layer silently"
/// failure semantics.
pub fn slice(mesh_path: &Path, cfg: &Config) -> Result<Vec<Layer>> {
    cfg.validate()?;

    let mesh = mesh::load_stl(mesh_path)?;
    let (min, max) = mesh
        .bounds()
        .ok_or_else(|| SlicerError::InvalidMesh("mesh has no extent".into()))?;

    let n = slice::layer_count(min[2], max[2], cfg.layer_height);
    if n == 0 {
        return Err(SlicerError::InvalidMesh("model too thin to slice".into()));
    }
    let heights = slice::layer_heights(min[2], max[2], cfg.layer_height);
    info!(candidate_layers = n, "computed layer stack");

    let sections = slice::slice_mesh(&mesh, &heights)?;

    let perimeter_settings = perimeter::PerimeterSettings {
        nozzle_diameter: cfg.nozzle_diameter,
        perimeters: cfg.perimeters,
    };

    let mut layers = Vec::with_capacity(sections.len());

    for section in sections {
        if section.is_empty() {
            continue;
        }

        let region = region::build_region(section.segments, cfg)?;
        if region.is_empty() {
            continue;
        }

        let solid = slice::is_solid(section.index, n, cfg.bottom_layers, cfg.top_layers);

        let walls = perimeter::generate_perimeters(&region, &perimeter_settings);

        let infill_settings = infill::InfillSettings {
            nozzle_diameter: cfg.nozzle_diameter,
            solid,
            fill_angles: cfg.fill_angles.clone(),
            infill_density: cfg.infill_density,
            solid_overlap: cfg.solid_overlap,
        };
        let infill = infill::generate_infill(&region, &infill_settings);

        debug!(
            z = section.z,
            solid,
            walls = walls.len(),
            infill = infill.len(),
            "layer built"
        );

        layers.push(Layer {
            z: section.z,
            solid,
            walls,
            infill,
        });
    }

    Ok(layers)
}
