//! End-to-end scenarios on synthetic grids.

use approx::assert_abs_diff_eq;
use slope_core::{
    analyze, analyze_raster, AnalysisConfig, CellLookup, GeoTransform, PathGeometry, RasterBand, SegmentVerdict,
    SlopeError,
};

/// `n×n` band with 1 m pixels covering `[0, n] × [0, n]`.
fn band(n: usize, z: impl Fn(usize, usize) -> f32) -> RasterBand {
    let mut data = Vec::with_capacity(n * n);
    for r in 0..n {
        for c in 0..n {
            data.push(z(r, c));
        }
    }
    RasterBand { data, width: n, height: n, transform: GeoTransform::unit(n), nodata: None }
}

#[test]
fn scenario_a_constant_grid_passes() {
    let summary = analyze_raster(band(50, |_, _| 100.0), &AnalysisConfig::default()).unwrap();
    assert_eq!(summary.max_slope_pct, 0.0);
    assert_eq!(summary.mean_slope_pct, 0.0);
    assert_eq!(summary.pixels_total, 2500);
    assert_eq!(summary.pixels_violating_running, 0);
    assert_eq!(summary.percent_violating_running, 0.0);
    assert_eq!(summary.running_threshold_pct, 5.0);
    assert!(summary.pass);
}

#[test]
fn scenario_b_eight_percent_plane_fails_everywhere() {
    let summary = analyze_raster(band(50, |_, c| c as f32 * 0.08), &AnalysisConfig::default()).unwrap();
    assert_abs_diff_eq!(summary.max_slope_pct, 8.0, epsilon = 1e-3);
    assert_abs_diff_eq!(summary.mean_slope_pct, 8.0, epsilon = 1e-3);
    assert_eq!(summary.pixels_violating_running, 2500);
    assert_eq!(summary.percent_violating_running, 100.0);
    assert_eq!(summary.histogram.iter().sum::<usize>(), summary.pixels_total);
    assert_eq!(summary.histogram_max_pct, 10.0);
    // Every cell sits at ≈8% of a 0–10% range.
    assert_eq!(summary.histogram[7] + summary.histogram[8], 2500);
    assert!(!summary.pass);
}

#[test]
fn planar_slope_is_independent_of_grid_size() {
    for n in [4, 17, 80] {
        let summary = analyze_raster(band(n, |r, _| r as f32 * 0.03), &AnalysisConfig::default()).unwrap();
        assert_abs_diff_eq!(summary.max_slope_pct, 3.0, epsilon = 1e-3);
        assert!(summary.pass);
    }
}

#[test]
fn tiny_and_empty_grids_are_rejected() {
    let cfg = AnalysisConfig::default();
    assert!(matches!(analyze_raster(band(1, |_, _| 7.0), &cfg), Err(SlopeError::Data(_))));
    assert!(matches!(analyze_raster(band(6, |_, _| f32::NAN), &cfg), Err(SlopeError::Data(_))));
    let mut nodata_only = band(4, |_, _| -32768.0);
    nodata_only.nodata = Some(-32768.0);
    assert!(matches!(analyze_raster(nodata_only, &cfg), Err(SlopeError::Data(_))));
}

#[test]
fn cross_slope_depends_on_heading_relative_to_aspect() {
    // 6% plane rising east; aspect 270° everywhere.
    let paths = [
        PathGeometry::new("downhill", [(38.0, 20.0), (2.0, 20.0)]),
        PathGeometry::new("across", [(20.0, 2.0), (20.0, 38.0)]),
    ];
    let report = analyze(band(40, |_, c| c as f32 * 0.06), &paths, &AnalysisConfig::default()).unwrap();

    match report.paths[0].verdict {
        SegmentVerdict::Evaluated { running_max_pct, cross_max_pct, running_ok, cross_ok } => {
            assert_abs_diff_eq!(running_max_pct, 6.0, epsilon = 1e-3);
            assert_abs_diff_eq!(cross_max_pct, 0.0, epsilon = 1e-6);
            assert!(!running_ok);
            assert!(cross_ok);
        }
        ref other => panic!("unexpected {other:?}"),
    }
    match report.paths[1].verdict {
        SegmentVerdict::Evaluated { running_max_pct, cross_max_pct, .. } => {
            assert_abs_diff_eq!(cross_max_pct, running_max_pct, epsilon = 1e-6);
        }
        ref other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn partially_outside_path_counts_exclusions() {
    let paths = [PathGeometry::new("edge", [(10.0, 5.0), (30.0, 5.0)])];
    let report = analyze(band(20, |_, _| 3.0), &paths, &AnalysisConfig::default()).unwrap();
    let result = &report.paths[0];
    // Samples at x = 10, 12, …, 30; those beyond x = 20 fall off the grid.
    assert_eq!(result.samples_total, 11);
    assert_eq!(result.samples_valid, 6);
    assert_eq!(result.samples_out_of_bounds, 5);
    assert_eq!(result.verdict.passes(), Some(true));
}

#[test]
fn identical_inputs_serialize_identically() {
    let make = || {
        let grid = band(33, |r, c| ((r as f32 * 0.37).sin() * 2.0 + c as f32 * 0.05).max(0.0));
        let paths = vec![
            PathGeometry::new("a", [(1.0, 1.0), (31.5, 20.25), (10.0, 32.0)]),
            PathGeometry::closed_ring("b", [(5.0, 5.0), (25.0, 5.0), (25.0, 25.0), (5.0, 25.0)]),
        ];
        (grid, paths)
    };
    let config = AnalysisConfig { lookup: CellLookup::Bilinear, sample_interval_m: 1.25, ..AnalysisConfig::default() };

    let (g1, p1) = make();
    let (g2, p2) = make();
    let first = serde_json::to_string(&analyze(g1, &p1, &config).unwrap()).unwrap();
    let second = serde_json::to_string(&analyze(g2, &p2, &config).unwrap()).unwrap();
    assert_eq!(first, second);
}
