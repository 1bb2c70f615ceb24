//! fdm-slice — command-line front end for the slicer engine.
//!
//! Converts an STL mesh into G-code: `fdm-slice model.stl model.gcode`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use fdm_slicer::Config;

#[derive(Parser)]
#[command(name = "fdm-slice")]
#[command(about = "Slice an STL mesh into G-code", long_about = None)]
struct Cli {
    /// Input STL file (binary or ASCII).
    input: PathBuf,
    /// Output G-code file.
    output: PathBuf,
    /// Optional TOML configuration file. Fields not present fall back to
    /// defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Config::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Config::default(),
    };

    fdm_gcode::process(&cli.input, &cli.output, &cfg).map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("wrote {}", cli.output.display());
    Ok(())
}
