#![warn(missing_docs)]

//! G-code generation for the slicer engine.
//!
//! This crate owns the one remaining pipeline stage not covered by
//! `fdm-slicer`: serializing sliced layers to G-code text, and the
//! top-level `process` entry point that ties mesh-in to G-code-out.
//!
//! # Example
//!
//! ```ignore
//! use fdm_gcode::process;
//! use fdm_slicer::Config;
//!
//! let cfg = Config::default();
//! process(Path::new("model.stl"), Path::new("model.gcode"), &cfg)?;
//! ```

pub mod gcode;
pub mod writer;

pub use gcode::{GcodeGenerator, GcodeSettings};
pub use writer::process;
