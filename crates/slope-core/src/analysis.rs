//! Pipeline orchestrator: grid → gradients → raster summary → per-path results.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::{classify_path, classify_raster, RasterComplianceSummary, SegmentResult};
use crate::config::{AnalysisConfig, OutOfBoundsPolicy};
use crate::error::SlopeError;
use crate::evaluator::{SlopeEvaluator, SlopeSample, UndefinedReason};
use crate::gradient::{compute_gradient, GradientField};
use crate::grid::{BandSource, ElevationGrid};
use crate::sampler::{place_samples, PathGeometry};
use crate::Result;

/// Everything one analysis call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub raster: RasterComplianceSummary,
    /// One entry per input path, in input order.
    pub paths: Vec<SegmentResult>,
    pub paths_passing: usize,
    pub paths_failing: usize,
    pub paths_indeterminate: usize,
}

/// Grid-level analysis only.
pub fn analyze_raster<S: BandSource>(source: S, config: &AnalysisConfig) -> Result<RasterComplianceSummary> {
    config.validate()?;
    let grid = ElevationGrid::load(source)?;
    let field = compute_gradient(&grid);
    classify_raster(&field, &config.thresholds)
}

/// Grid-level summary plus one [`SegmentResult`] per path.
pub fn analyze<S: BandSource>(source: S, paths: &[PathGeometry], config: &AnalysisConfig) -> Result<ComplianceReport> {
    config.validate()?;
    let grid = ElevationGrid::load(source)?;
    analyze_grid(&grid, paths, config)
}

/// Same as [`analyze`] for an already validated grid.
pub fn analyze_grid(grid: &ElevationGrid, paths: &[PathGeometry], config: &AnalysisConfig) -> Result<ComplianceReport> {
    config.validate()?;
    let field = compute_gradient(grid);
    let raster = classify_raster(&field, &config.thresholds)?;
    info!(
        pixels = raster.pixels_total,
        violating = raster.pixels_violating_running,
        max_slope_pct = raster.max_slope_pct,
        "classified raster"
    );

    let paths = evaluate_paths(grid, &field, paths, config)?;

    let mut report = ComplianceReport { raster, paths, paths_passing: 0, paths_failing: 0, paths_indeterminate: 0 };
    for result in &report.paths {
        match result.verdict.passes() {
            Some(true) => report.paths_passing += 1,
            Some(false) => report.paths_failing += 1,
            None => report.paths_indeterminate += 1,
        }
    }
    info!(
        passing = report.paths_passing,
        failing = report.paths_failing,
        indeterminate = report.paths_indeterminate,
        "classified paths"
    );
    Ok(report)
}

#[cfg(not(feature = "threading"))]
fn evaluate_paths(
    grid: &ElevationGrid,
    field: &GradientField,
    paths: &[PathGeometry],
    config: &AnalysisConfig,
) -> Result<Vec<SegmentResult>> {
    paths.iter().map(|p| evaluate_path(grid, field, p, config)).collect()
}

/// Ordered parallel map: results keep input order, and the error reported
/// is the one from the earliest failing path, as in the sequential build.
#[cfg(feature = "threading")]
fn evaluate_paths(
    grid: &ElevationGrid,
    field: &GradientField,
    paths: &[PathGeometry],
    config: &AnalysisConfig,
) -> Result<Vec<SegmentResult>> {
    use rayon::prelude::*;
    let results: Vec<Result<SegmentResult>> =
        paths.par_iter().map(|p| evaluate_path(grid, field, p, config)).collect();
    results.into_iter().collect()
}

/// Sample, evaluate and classify one path.
pub fn evaluate_path(
    grid: &ElevationGrid,
    field: &GradientField,
    path: &PathGeometry,
    config: &AnalysisConfig,
) -> Result<SegmentResult> {
    let points = place_samples(path, config.sample_interval_m, config.placement)?;
    let evaluator = SlopeEvaluator::new(grid, field, config.lookup, config.running_slope);
    let samples = evaluator.evaluate_all(&points);

    if config.out_of_bounds == OutOfBoundsPolicy::Abort {
        let outside = samples
            .iter()
            .zip(&points)
            .find(|(s, _)| matches!(s, SlopeSample::Undefined { reason: UndefinedReason::OutOfBounds }));
        if let Some((_, p)) = outside {
            return Err(SlopeError::OutOfBounds { path_id: path.id.clone(), x: p.x, y: p.y });
        }
    }

    let result = classify_path(&path.id, &samples, &config.thresholds);
    debug!(path = %path.id, samples = result.samples_total, valid = result.samples_valid, "evaluated path");
    if result.samples_out_of_bounds > 0 || result.samples_nodata > 0 {
        warn!(
            path = %path.id,
            out_of_bounds = result.samples_out_of_bounds,
            nodata = result.samples_nodata,
            "excluded undefined samples"
        );
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SegmentVerdict;
    use crate::config::RunningSlopeMode;

    fn ramp_band() -> crate::grid::RasterBand {
        let grid = ElevationGrid::from_fn(30, 30, |_, c| c as f32 * 0.04).unwrap();
        crate::grid::RasterBand {
            data: grid.data().to_vec(),
            width: 30,
            height: 30,
            transform: *grid.transform(),
            nodata: None,
        }
    }

    #[test]
    fn counts_each_verdict_once() {
        // 4% eastward ramp on a 30×30 unit grid.
        let paths = vec![
            PathGeometry::new("east", [(2.0, 15.0), (28.0, 15.0)]),
            PathGeometry::new("north", [(15.0, 2.0), (15.0, 28.0)]),
            PathGeometry::new("outside", [(100.0, 100.0), (120.0, 100.0)]),
        ];
        let report = analyze(ramp_band(), &paths, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.paths.len(), 3);
        assert_eq!(report.paths[0].verdict.passes(), Some(true));
        // Walking north across a 4% fall line: cross slope ≈ 4% > 2.083%.
        assert!(matches!(
            report.paths[1].verdict,
            SegmentVerdict::Evaluated { running_ok: true, cross_ok: false, .. }
        ));
        assert_eq!(report.paths[2].verdict, SegmentVerdict::Indeterminate);
        assert_eq!((report.paths_passing, report.paths_failing, report.paths_indeterminate), (1, 1, 1));
    }

    #[test]
    fn abort_policy_surfaces_out_of_bounds() {
        let config = AnalysisConfig { out_of_bounds: OutOfBoundsPolicy::Abort, ..AnalysisConfig::default() };
        let paths = vec![PathGeometry::new("leaves", [(25.0, 15.0), (35.0, 15.0)])];
        match analyze(ramp_band(), &paths, &config) {
            Err(SlopeError::OutOfBounds { path_id, x, .. }) => {
                assert_eq!(path_id, "leaves");
                assert!(x > 30.0);
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_fails_before_loading() {
        let config = AnalysisConfig { sample_interval_m: -2.0, ..AnalysisConfig::default() };
        assert!(matches!(analyze_raster(ramp_band(), &config), Err(SlopeError::Config(_))));
    }

    #[test]
    fn degenerate_path_aborts_analysis() {
        let paths = vec![PathGeometry::new("dot", [(5.0, 5.0), (5.0, 5.0)])];
        assert!(matches!(
            analyze(ramp_band(), &paths, &AnalysisConfig::default()),
            Err(SlopeError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn along_path_mode_relaxes_contour_walks() {
        let config = AnalysisConfig { running_slope: RunningSlopeMode::AlongPath, ..AnalysisConfig::default() };
        let paths = vec![PathGeometry::new("contour", [(15.0, 2.0), (15.0, 28.0)])];
        let report = analyze(ramp_band(), &paths, &config).unwrap();
        match report.paths[0].verdict {
            SegmentVerdict::Evaluated { running_max_pct, .. } => assert!(running_max_pct < 1e-6),
            ref other => panic!("unexpected verdict {other:?}"),
        }
    }

    #[test]
    fn many_paths_keep_input_order_and_earliest_error() {
        let paths: Vec<PathGeometry> = (0..64)
            .map(|i| {
                let y = 1.0 + (i % 28) as f64;
                PathGeometry::new(format!("p{i:02}"), [(1.0, y), (1.0 + (i % 27) as f64 + 1.0, y)])
            })
            .collect();
        let grid = ElevationGrid::load(ramp_band()).unwrap();
        let report = analyze_grid(&grid, &paths, &AnalysisConfig::default()).unwrap();
        let ids: Vec<&str> = report.paths.iter().map(|r| r.path_id.as_str()).collect();
        let expected: Vec<String> = (0..64).map(|i| format!("p{i:02}")).collect();
        assert_eq!(ids, expected);

        let mut broken = paths.clone();
        broken[40] = PathGeometry::new("late", [(3.0, 3.0)]);
        broken[17] = PathGeometry::new("early", [(3.0, 3.0)]);
        match analyze_grid(&grid, &broken, &AnalysisConfig::default()) {
            Err(SlopeError::DegenerateGeometry { path_id, .. }) => assert_eq!(path_id, "early"),
            other => panic!("expected DegenerateGeometry, got {other:?}"),
        }
    }
}
