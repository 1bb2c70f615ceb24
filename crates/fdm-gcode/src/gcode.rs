//! GCodeWriter — serializes sliced layers into G-code text with
//! extrusion bookkeeping.

use fdm_geom::Point2;
use fdm_slicer::{Config, Layer, Polygon, Polyline, Result, SlicerError};

const WALL_FLOW: f64 = 1.1;
const INFILL_FLOW: f64 = 1.0;
const MIN_EDGE_LENGTH: f64 = 0.01;

/// The running extruded-length accumulator. Zeroed at job start,
/// monotonically non-decreasing, never reset between layers.
#[derive(Debug, Clone, Copy, Default)]
struct ExtruderState {
    current_e: f64,
}

impl ExtruderState {
    fn advance(&mut self, delta: f64) -> f64 {
        self.current_e += delta;
        self.current_e
    }
}

/// The subset of [`Config`] the writer needs at emission time.
#[derive(Debug, Clone, Copy)]
pub struct GcodeSettings {
    /// Layer height (mm).
    pub layer_height: f64,
    /// Nozzle diameter (mm).
    pub nozzle_diameter: f64,
    /// Hotend target temperature (°C).
    pub print_temp: i32,
    /// Bed target temperature (°C).
    pub bed_temp: i32,
    /// Non-extruding travel speed (mm/s).
    pub travel_speed: f64,
    /// Default print speed (mm/s), used for the layer's Z-lower move.
    pub print_speed: f64,
    /// Outer wall print speed (mm/s).
    pub outer_wall_speed: f64,
    /// Infill print speed (mm/s).
    pub infill_speed: f64,
    /// Z-hop applied between layers (mm).
    pub z_hop: f64,
}

impl From<&Config> for GcodeSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            layer_height: cfg.layer_height,
            nozzle_diameter: cfg.nozzle_diameter,
            print_temp: cfg.print_temp,
            bed_temp: cfg.bed_temp,
            travel_speed: cfg.travel_speed,
            print_speed: cfg.print_speed,
            outer_wall_speed: cfg.outer_wall_speed,
            infill_speed: cfg.infill_speed,
            z_hop: cfg.z_hop,
        }
    }
}

/// Serializes an ordered sequence of layers into G-code text.
///
/// Vocabulary restricted to `G0`, `G1`, `G28`, `M84`, `M104`, `M140`,
/// and `;LAYER:` comments — no retraction, no arc moves, no per-flavor
/// dialect. One instance serializes exactly one job; `current_e` lives
/// on the instance and is never shared across jobs.
pub struct GcodeGenerator {
    settings: GcodeSettings,
    extruder: ExtruderState,
    out: String,
}

impl GcodeGenerator {
    /// Create a writer for the given machine settings.
    pub fn new(settings: GcodeSettings) -> Self {
        Self {
            settings,
            extruder: ExtruderState::default(),
            out: String::new(),
        }
    }

    /// Serialize every layer in order, returning the complete G-code text.
    pub fn generate(mut self, layers: &[Layer]) -> Result<String> {
        self.preamble();
        for layer in layers {
            self.emit_layer(layer)?;
        }
        self.postamble();
        Ok(self.out)
    }

    fn preamble(&mut self) {
        self.out.push_str("G28\n");
        self.out
            .push_str(&format!("M104 S{}\n", self.settings.print_temp));
        self.out
            .push_str(&format!("M140 S{}\n", self.settings.bed_temp));
        self.out.push_str("G1 Z10 F5000\n");
    }

    fn postamble(&mut self) {
        self.out.push_str("M104 S0\n");
        self.out.push_str("M140 S0\n");
        self.out.push_str("G28 X\n");
        self.out.push_str("M84\n");
    }

    fn emit_layer(&mut self, layer: &Layer) -> Result<()> {
        self.out.push_str(&format!(";LAYER:{:.2}\n", layer.z));
        self.out.push_str(&format!(
            "G0 Z{:.3} F3000\n",
            layer.z + self.settings.z_hop
        ));
        self.out.push_str(&format!(
            "G1 Z{:.3} F{}\n",
            layer.z,
            (self.settings.print_speed * 60.0).round() as i64
        ));

        for wall in &layer.walls {
            self.emit_polygon(wall, self.settings.outer_wall_speed, WALL_FLOW)?;
        }
        for path in &layer.infill {
            self.emit_polyline(path, self.settings.infill_speed, INFILL_FLOW)?;
        }

        Ok(())
    }

    fn emit_polygon(&mut self, polygon: &Polygon, speed: f64, flow: f64) -> Result<()> {
        if polygon.points.len() < 2 {
            return Ok(());
        }
        let mut points = polygon.points.clone();
        points.push(points[0]);
        self.emit_points(&points, speed, flow)
    }

    fn emit_polyline(&mut self, polyline: &Polyline, speed: f64, flow: f64) -> Result<()> {
        if polyline.points.len() < 2 {
            return Ok(());
        }
        self.emit_points(&polyline.points, speed, flow)
    }

    fn emit_points(&mut self, points: &[Point2], speed: f64, flow: f64) -> Result<()> {
        let feed = (speed * 60.0).round() as i64;
        let travel_feed = (self.settings.travel_speed * 60.0).round() as i64;

        let p0 = points[0];
        self.out
            .push_str(&format!("G0 X{:.3} Y{:.3} F{}\n", p0.x, p0.y, travel_feed));

        let d = self.settings.nozzle_diameter;
        let h = self.settings.layer_height;
        let filament_area = std::f64::consts::PI * (d / 2.0).powi(2);

        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let length = (b - a).norm();
            if length < MIN_EDGE_LENGTH {
                continue;
            }
            if !length.is_finite() {
                return Err(SlicerError::GeometryError(
                    "non-finite edge length during G-code emission".into(),
                ));
            }

            let delta_e = (h * d * length * flow) / filament_area;
            let e = self.extruder.advance(delta_e);
            self.out
                .push_str(&format!("G1 X{:.3} Y{:.3} E{:.5} F{}\n", b.x, b.y, e, feed));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GcodeSettings {
        GcodeSettings {
            layer_height: 0.2,
            nozzle_diameter: 0.4,
            print_temp: 210,
            bed_temp: 60,
            travel_speed: 200.0,
            print_speed: 50.0,
            outer_wall_speed: 30.0,
            infill_speed: 80.0,
            z_hop: 0.3,
        }
    }

    fn square_layer(z: f64) -> Layer {
        Layer {
            z,
            solid: false,
            walls: vec![Polygon::new(vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ])],
            infill: vec![Polyline::new(vec![Point2::new(1.0, 1.0), Point2::new(9.0, 1.0)])],
        }
    }

    #[test]
    fn test_preamble_and_postamble_vocabulary() {
        let gcode = GcodeGenerator::new(settings()).generate(&[]).unwrap();
        assert!(gcode.starts_with("G28\nM104 S210\nM140 S60\nG1 Z10 F5000\n"));
        assert!(gcode.ends_with("M104 S0\nM140 S0\nG28 X\nM84\n"));
    }

    #[test]
    fn test_extruder_monotonic_across_layers() {
        let layers = vec![square_layer(0.0), square_layer(0.2)];
        let gcode = GcodeGenerator::new(settings()).generate(&layers).unwrap();

        let mut last_e = 0.0;
        for line in gcode.lines() {
            if let Some(pos) = line.find('E') {
                let rest = &line[pos + 1..];
                let value: f64 = rest.split_whitespace().next().unwrap().parse().unwrap();
                assert!(value >= last_e);
                last_e = value;
            }
        }
        assert!(last_e > 0.0);
    }

    #[test]
    fn test_short_edge_is_skipped() {
        let layer = Layer {
            z: 0.0,
            solid: false,
            walls: Vec::new(),
            infill: vec![Polyline::new(vec![
                Point2::new(0.0, 0.0),
                Point2::new(0.005, 0.0),
            ])],
        };
        let gcode = GcodeGenerator::new(settings()).generate(&[layer]).unwrap();
        // The only "G1" lines are the preamble's Z-raise and the layer's Z-lower;
        // the sub-0.01mm infill edge emits no G1 X/Y/E line at all.
        assert_eq!(gcode.matches("G1").count(), 2);
        assert!(!gcode.contains("G1 X"));
    }

    #[test]
    fn test_layer_comment_uses_two_decimals() {
        let gcode = GcodeGenerator::new(settings())
            .generate(&[square_layer(1.2)])
            .unwrap();
        assert!(gcode.contains(";LAYER:1.20\n"));
    }

    #[test]
    fn test_g0_precedes_each_path() {
        let gcode = GcodeGenerator::new(settings())
            .generate(&[square_layer(0.0)])
            .unwrap();
        let mut after_layer = false;
        let mut saw_g0_for_path = false;
        for line in gcode.lines() {
            if line.starts_with(";LAYER:") {
                after_layer = true;
            }
            if after_layer && line.starts_with("G0 X") {
                saw_g0_for_path = true;
            }
            if after_layer && line.starts_with("G1 X") {
                assert!(saw_g0_for_path);
            }
        }
    }
}
