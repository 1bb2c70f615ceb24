//! Job configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlicerError};

/// Machine and slicing parameters for a single job.
///
/// Immutable once constructed; shared by reference across every pipeline
/// stage. Field names mirror the reference slicer's settings dictionary
/// so that a TOML file written against one matches the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layer height (mm).
    pub layer_height: f64,
    /// Nozzle diameter (mm).
    pub nozzle_diameter: f64,
    /// Filament diameter (mm). Reserved for a future volumetric-E mode.
    pub filament_diameter: f64,
    /// Hotend target temperature (°C).
    pub print_temp: i32,
    /// Bed target temperature (°C).
    pub bed_temp: i32,
    /// Non-extruding travel speed (mm/s).
    pub travel_speed: f64,
    /// Default print speed (mm/s).
    pub print_speed: f64,
    /// Outer wall print speed (mm/s).
    pub outer_wall_speed: f64,
    /// Infill print speed (mm/s).
    pub infill_speed: f64,
    /// Infill density, percent. May exceed 100 to over-pack sparse infill.
    pub infill_density: f64,
    /// Retraction distance (mm). Unused by the G-code vocabulary in scope
    /// but retained so a configuration file round-trips.
    pub retraction: f64,
    /// Retraction speed (mm/s).
    pub retract_speed: f64,
    /// Z-hop applied between layers (mm).
    pub z_hop: f64,
    /// Number of bottom layers forced solid.
    pub bottom_layers: usize,
    /// Number of top layers forced solid.
    pub top_layers: usize,
    /// Number of concentric perimeter walls.
    pub perimeters: u32,
    /// Area threshold (mm²) below which a region is discarded.
    pub small_feature: f64,
    /// Fraction of nozzle diameter by which infill is expanded into walls.
    pub solid_overlap: f64,
    /// Fill angles (degrees), all applied to every layer.
    pub fill_angles: Vec<f64>,
    /// Signed outward offset (mm) applied to each raw section outline.
    pub xy_compensation: f64,
    /// Douglas-Peucker simplification tolerance (mm).
    pub simplify_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layer_height: 0.12,
            nozzle_diameter: 0.4,
            filament_diameter: 1.75,
            print_temp: 210,
            bed_temp: 60,
            travel_speed: 200.0,
            print_speed: 50.0,
            outer_wall_speed: 30.0,
            infill_speed: 80.0,
            infill_density: 120.0,
            retraction: 5.0,
            retract_speed: 40.0,
            z_hop: 0.3,
            bottom_layers: 15,
            top_layers: 15,
            perimeters: 8,
            small_feature: 0.0001,
            solid_overlap: 0.3,
            fill_angles: vec![45.0, 135.0, 90.0],
            xy_compensation: 0.002,
            simplify_tolerance: 0.0005,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text. Missing fields fall back to
    /// [`Config::default`].
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)
            .map_err(|e| SlicerError::InvalidSettings(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the rest of the pipeline
    /// produce nonsensical or non-terminating output.
    pub fn validate(&self) -> Result<()> {
        if self.layer_height <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "layer_height must be positive".into(),
            ));
        }
        if self.nozzle_diameter <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "nozzle_diameter must be positive".into(),
            ));
        }
        if self.perimeters == 0 {
            return Err(SlicerError::InvalidSettings(
                "perimeters must be at least 1".into(),
            ));
        }
        if self.fill_angles.is_empty() {
            return Err(SlicerError::InvalidSettings(
                "fill_angles must be non-empty".into(),
            ));
        }
        Ok(())
    }
}
