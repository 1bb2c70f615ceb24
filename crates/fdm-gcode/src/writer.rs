//! Engine entry point: mesh path in, G-code file out.

use std::fs;
use std::path::Path;

use fdm_slicer::{Config, Result, SlicerError};

use crate::gcode::{GcodeGenerator, GcodeSettings};

/// Run the complete pipeline over `input` (an STL file) and write the
/// resulting G-code to `output`.
///
/// Idempotent: each call slices the mesh fresh and constructs a new
/// [`GcodeGenerator`], so the extruder counter always starts at zero.
/// The output is written to a temporary path alongside `output` and
/// renamed into place on success, so a failure never leaves a partial
/// file at the destination.
pub fn process(input: &Path, output: &Path, cfg: &Config) -> Result<()> {
    let layers = fdm_slicer::slice(input, cfg)?;

    let settings = GcodeSettings::from(cfg);
    let text = GcodeGenerator::new(settings).generate(&layers)?;

    let tmp_path = temp_path_for(output);
    fs::write(&tmp_path, &text).map_err(|e| SlicerError::IOError(e.to_string()))?;
    fs::rename(&tmp_path, output).map_err(|e| SlicerError::IOError(e.to_string()))?;

    Ok(())
}

fn temp_path_for(output: &Path) -> std::path::PathBuf {
    let mut tmp = output.as_os_str().to_owned();
    tmp.push(".tmp");
    std::path::PathBuf::from(tmp)
}
