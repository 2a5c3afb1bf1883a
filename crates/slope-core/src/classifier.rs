//! Pass/fail reductions over slope values.
//!
//! Raster mode classifies every finite slope cell against the running limit
//! and builds a 10-bin histogram over `[0, max(10, max_slope_pct)]`. Path mode
//! reduces each path's defined samples to maxima and compares them with both
//! limits. Non-finite values never enter a reduction.

use serde::{Deserialize, Serialize};

use crate::config::ComplianceThresholds;
use crate::error::SlopeError;
use crate::evaluator::{SlopeSample, UndefinedReason};
use crate::gradient::GradientField;
use crate::Result;

pub const HISTOGRAM_BINS: usize = 10;
/// Lower bound on the histogram's upper edge, percent.
const HISTOGRAM_MIN_RANGE_PCT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterComplianceSummary {
    pub running_threshold_pct: f64,
    pub cross_threshold_pct: f64,
    /// Cells with a finite slope.
    pub pixels_total: usize,
    pub pixels_violating_running: usize,
    pub percent_violating_running: f64,
    pub max_slope_pct: f64,
    pub mean_slope_pct: f64,
    /// Counts per equal-width bin; the last bin includes its upper edge,
    /// so the counts sum to `pixels_total`.
    pub histogram: [usize; HISTOGRAM_BINS],
    /// Upper edge of the histogram range.
    pub histogram_max_pct: f64,
    pub pass: bool,
}

/// Classify every finite cell of `field` against the running limit.
pub fn classify_raster(field: &GradientField, thresholds: &ComplianceThresholds) -> Result<RasterComplianceSummary> {
    let mut total = 0usize;
    let mut violating = 0usize;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0f64;
    for s in field.finite_slopes() {
        total += 1;
        sum += s;
        max = max.max(s);
        if s > thresholds.running_max_pct {
            violating += 1;
        }
    }
    if total == 0 {
        return Err(SlopeError::Data(
            "slope field has no finite cells (every elevation is isolated by nodata)".into(),
        ));
    }

    let histogram_max_pct = max.max(HISTOGRAM_MIN_RANGE_PCT);
    let mut histogram = [0usize; HISTOGRAM_BINS];
    for s in field.finite_slopes() {
        let bin = ((s / histogram_max_pct) * HISTOGRAM_BINS as f64) as usize;
        histogram[bin.min(HISTOGRAM_BINS - 1)] += 1;
    }

    Ok(RasterComplianceSummary {
        running_threshold_pct: thresholds.running_max_pct,
        cross_threshold_pct: thresholds.cross_max_pct,
        pixels_total: total,
        pixels_violating_running: violating,
        percent_violating_running: violating as f64 / total as f64 * 100.0,
        max_slope_pct: max,
        mean_slope_pct: sum / total as f64,
        histogram,
        histogram_max_pct,
        pass: violating == 0,
    })
}

/// Outcome of one path. `Indeterminate` when no sample was defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentVerdict {
    Evaluated {
        running_max_pct: f64,
        cross_max_pct: f64,
        running_ok: bool,
        cross_ok: bool,
    },
    Indeterminate,
}

impl SegmentVerdict {
    /// `Some(true)` when both limits hold, `None` when indeterminate.
    pub fn passes(&self) -> Option<bool> {
        match self {
            SegmentVerdict::Evaluated { running_ok, cross_ok, .. } => Some(*running_ok && *cross_ok),
            SegmentVerdict::Indeterminate => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub path_id: String,
    #[serde(flatten)]
    pub verdict: SegmentVerdict,
    pub samples_total: usize,
    pub samples_valid: usize,
    pub samples_out_of_bounds: usize,
    pub samples_nodata: usize,
}

/// Reduce a path's samples to its compliance verdict.
pub fn classify_path(path_id: &str, samples: &[SlopeSample], thresholds: &ComplianceThresholds) -> SegmentResult {
    let mut valid = 0usize;
    let mut out_of_bounds = 0usize;
    let mut nodata = 0usize;
    let mut running_max = f64::NEG_INFINITY;
    let mut cross_max = f64::NEG_INFINITY;

    for sample in samples {
        match *sample {
            SlopeSample::Defined { running_slope_pct, cross_slope_pct, .. }
                if running_slope_pct.is_finite() && cross_slope_pct.is_finite() =>
            {
                valid += 1;
                running_max = running_max.max(running_slope_pct);
                cross_max = cross_max.max(cross_slope_pct);
            }
            SlopeSample::Defined { .. } => nodata += 1,
            SlopeSample::Undefined { reason: UndefinedReason::OutOfBounds } => out_of_bounds += 1,
            SlopeSample::Undefined { reason: UndefinedReason::NoData } => nodata += 1,
        }
    }

    let verdict = if valid == 0 {
        SegmentVerdict::Indeterminate
    } else {
        SegmentVerdict::Evaluated {
            running_max_pct: running_max,
            cross_max_pct: cross_max,
            running_ok: running_max <= thresholds.running_max_pct,
            cross_ok: cross_max <= thresholds.cross_max_pct,
        }
    };

    SegmentResult {
        path_id: path_id.to_owned(),
        verdict,
        samples_total: samples.len(),
        samples_valid: valid,
        samples_out_of_bounds: out_of_bounds,
        samples_nodata: nodata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::compute_gradient;
    use crate::grid::ElevationGrid;
    use approx::assert_abs_diff_eq;

    fn defined(running: f64, cross: f64) -> SlopeSample {
        SlopeSample::Defined { running_slope_pct: running, cross_slope_pct: cross, aspect_deg: 0.0 }
    }

    #[test]
    fn flat_raster_passes() {
        let grid = ElevationGrid::from_fn(12, 9, |_, _| 42.0).unwrap();
        let summary = classify_raster(&compute_gradient(&grid), &ComplianceThresholds::default()).unwrap();
        assert_eq!(summary.pixels_total, 108);
        assert_eq!(summary.pixels_violating_running, 0);
        assert_eq!(summary.max_slope_pct, 0.0);
        assert_eq!(summary.histogram[0], 108);
        assert_eq!(summary.histogram_max_pct, 10.0);
        assert!(summary.pass);
    }

    #[test]
    fn histogram_sums_to_total_and_top_value_lands_in_last_bin() {
        // Slope grows with the row: a mix of gentle and steep cells.
        let grid = ElevationGrid::from_fn(10, 10, |r, c| (c as f64 * 0.02 * r as f64) as f32).unwrap();
        let summary = classify_raster(&compute_gradient(&grid), &ComplianceThresholds::default()).unwrap();
        assert_eq!(summary.histogram.iter().sum::<usize>(), summary.pixels_total);
        assert!(summary.histogram[HISTOGRAM_BINS - 1] >= 1);
        assert!(summary.max_slope_pct > 10.0);
        assert_eq!(summary.histogram_max_pct, summary.max_slope_pct);
        assert!(!summary.pass);
        assert_abs_diff_eq!(
            summary.percent_violating_running,
            summary.pixels_violating_running as f64 / summary.pixels_total as f64 * 100.0
        );
    }

    #[test]
    fn isolated_finite_cells_are_a_data_error() {
        // Only the corners are finite: every finite difference touches NaN.
        let n = f32::NAN;
        let grid = ElevationGrid::from_band(crate::grid::RasterBand {
            data: vec![1.0, n, 1.0, n, n, n, 1.0, n, 1.0],
            width: 3,
            height: 3,
            transform: crate::grid::GeoTransform::unit(3),
            nodata: None,
        })
        .unwrap();
        let field = compute_gradient(&grid);
        assert!(matches!(
            classify_raster(&field, &ComplianceThresholds::default()),
            Err(SlopeError::Data(_))
        ));
    }

    #[test]
    fn path_maxima_are_compared_inclusively() {
        let t = ComplianceThresholds::default();
        let samples = [defined(1.0, 0.5), defined(5.0, 2.083), defined(3.0, 1.0)];
        let result = classify_path("a", &samples, &t);
        assert_eq!(
            result.verdict,
            SegmentVerdict::Evaluated { running_max_pct: 5.0, cross_max_pct: 2.083, running_ok: true, cross_ok: true }
        );
        assert_eq!(result.verdict.passes(), Some(true));

        let result = classify_path("b", &[defined(5.01, 3.0)], &t);
        assert_eq!(result.verdict.passes(), Some(false));
    }

    #[test]
    fn undefined_samples_are_excluded_and_counted() {
        let t = ComplianceThresholds::default();
        let samples = [
            SlopeSample::Undefined { reason: UndefinedReason::OutOfBounds },
            defined(2.0, 1.0),
            SlopeSample::Undefined { reason: UndefinedReason::NoData },
            SlopeSample::Undefined { reason: UndefinedReason::OutOfBounds },
        ];
        let result = classify_path("p", &samples, &t);
        assert_eq!(result.samples_total, 4);
        assert_eq!(result.samples_valid, 1);
        assert_eq!(result.samples_out_of_bounds, 2);
        assert_eq!(result.samples_nodata, 1);
        assert_eq!(result.verdict.passes(), Some(true));
    }

    #[test]
    fn no_valid_samples_is_indeterminate_not_a_pass() {
        let samples = [SlopeSample::Undefined { reason: UndefinedReason::OutOfBounds }];
        let result = classify_path("lost", &samples, &ComplianceThresholds::default());
        assert_eq!(result.verdict, SegmentVerdict::Indeterminate);
        assert_eq!(result.verdict.passes(), None);
        let empty = classify_path("empty", &[], &ComplianceThresholds::default());
        assert_eq!(empty.verdict, SegmentVerdict::Indeterminate);
    }

    #[test]
    fn segment_result_serializes_flat_with_status_tag() {
        let result = classify_path("walk", &[defined(1.0, 0.5)], &ComplianceThresholds::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["path_id"], "walk");
        assert_eq!(json["status"], "evaluated");
        assert_eq!(json["running_ok"], true);
        let json = serde_json::to_value(classify_path("x", &[], &ComplianceThresholds::default())).unwrap();
        assert_eq!(json["status"], "indeterminate");
    }
}
