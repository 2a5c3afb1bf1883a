//! Slope compliance evaluator: reads a projected GeoTIFF DEM and, optionally,
//! a GeoJSON file of pedestrian paths in the same CRS, and writes a JSON
//! compliance report (raster summary + one result per path).
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); the report goes to
//! `--out` or stdout.

mod geojson;
mod geotiff;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use slope_core::{analyze, AnalysisConfig, CellLookup, OutOfBoundsPolicy, RunningSlopeMode, SamplePlacement};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::geotiff::GeoTiffSource;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "evaluate", about = "Check DEM slope and path running/cross slope against accessibility limits")]
struct Args {
    /// Elevation GeoTIFF (projected CRS, metres)
    #[arg(long)]
    dem: PathBuf,

    /// GeoJSON FeatureCollection of paths in the DEM's CRS
    #[arg(long)]
    paths: Option<PathBuf>,

    /// JSON file with an AnalysisConfig; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report destination (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Path sampling interval in metres
    #[arg(long)]
    interval_m: Option<f64>,

    /// Running slope limit, percent
    #[arg(long)]
    running_thr: Option<f64>,

    /// Cross slope limit, percent
    #[arg(long)]
    cross_thr: Option<f64>,

    /// How slope is read at sample points
    #[arg(long, value_enum)]
    lookup: Option<Lookup>,

    /// Evaluate at midpoints between densified points
    #[arg(long)]
    midpoints: bool,

    /// Running slope as the directional derivative along the path
    #[arg(long)]
    along_path: bool,

    /// Fail instead of skipping samples that fall outside the DEM
    #[arg(long)]
    abort_out_of_bounds: bool,

    /// Pixel size in metres for DEMs without georeferencing tags
    #[arg(long)]
    res: Option<f64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Lookup {
    Nearest,
    Bilinear,
}

impl From<Lookup> for CellLookup {
    fn from(l: Lookup) -> Self {
        match l {
            Lookup::Nearest => CellLookup::Nearest,
            Lookup::Bilinear => CellLookup::Bilinear,
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(v) = args.interval_m {
        config.sample_interval_m = v;
    }
    if let Some(v) = args.running_thr {
        config.thresholds.running_max_pct = v;
    }
    if let Some(v) = args.cross_thr {
        config.thresholds.cross_max_pct = v;
    }
    if let Some(l) = args.lookup {
        config.lookup = l.into();
    }
    if args.midpoints {
        config.placement = SamplePlacement::Midpoints;
    }
    if args.along_path {
        config.running_slope = RunningSlopeMode::AlongPath;
    }
    if args.abort_out_of_bounds {
        config.out_of_bounds = OutOfBoundsPolicy::Abort;
    }
    config.validate()?;
    Ok(config)
}

// ── main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    let paths = match &args.paths {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading paths {}", path.display()))?;
            geojson::parse_paths(&text).with_context(|| format!("parsing paths {}", path.display()))?
        }
        None => Vec::new(),
    };
    info!(paths = paths.len(), dem = %args.dem.display(), "starting analysis");

    let source = GeoTiffSource::open(&args.dem, args.res)?;
    let report = analyze(source, &paths, &config)?;

    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(out) => {
            if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            fs::write(out, json).with_context(|| format!("writing report {}", out.display()))?;
            info!(out = %out.display(), "wrote report");
        }
        None => println!("{json}"),
    }
    Ok(())
}
