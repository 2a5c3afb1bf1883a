//! Per-cell finite-difference gradients, slope and aspect.
//!
//! Central differences on interior cells, one-sided differences on the grid
//! border, each divided by its own axis spacing:
//!
//! ```text
//!   dz/dx[r][c] = (z[r][c+1] − z[r][c−1]) / (2 · resx)     interior
//!               = (z[r][1]   − z[r][0])   / resx           west edge
//!               = (z[r][w−1] − z[r][w−2]) / resx           east edge
//!   dz/dy       = same along rows with resy, negated because rows run south
//! ```
//!
//! NaN (nodata) is never substituted: any difference touching a NaN cell is
//! NaN, and so are the slope and aspect derived from it. A nodata cell's own
//! central difference skips it, so it is masked explicitly.

use tracing::debug;

use crate::angles;
use crate::grid::ElevationGrid;

/// Gradient-derived fields, row-major, same shape as the source grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    pub width: usize,
    pub height: usize,
    /// dz/dx, x = east (rise per metre).
    pub gradient_x: Vec<f64>,
    /// dz/dy, y = north (rise per metre).
    pub gradient_y: Vec<f64>,
    /// `100 · sqrt(gx² + gy²)`, unbounded above.
    pub slope_pct: Vec<f64>,
    /// Compass azimuth of steepest descent, `[0°, 360°)`; 0 on flat cells.
    pub aspect_deg: Vec<f64>,
}

impl GradientField {
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    #[inline]
    pub fn gradient(&self, row: usize, col: usize) -> (f64, f64) {
        let i = self.index(row, col);
        (self.gradient_x[i], self.gradient_y[i])
    }

    #[inline]
    pub fn slope_magnitude(&self, row: usize, col: usize) -> f64 {
        let (gx, gy) = self.gradient(row, col);
        gx.hypot(gy)
    }

    #[inline]
    pub fn slope_pct_at(&self, row: usize, col: usize) -> f64 {
        self.slope_pct[self.index(row, col)]
    }

    #[inline]
    pub fn aspect_at(&self, row: usize, col: usize) -> f64 {
        self.aspect_deg[self.index(row, col)]
    }

    /// Finite slope values, in row-major order.
    pub fn finite_slopes(&self) -> impl Iterator<Item = f64> + '_ {
        self.slope_pct.iter().copied().filter(|s| s.is_finite())
    }
}

/// First difference of `len` samples at position `i`, spacing `h`.
/// `at(k)` returns sample `k`. Requires `len ≥ 2`.
#[inline]
fn difference(at: impl Fn(usize) -> f64, i: usize, len: usize, h: f64) -> f64 {
    if i == 0 {
        (at(1) - at(0)) / h
    } else if i == len - 1 {
        (at(len - 1) - at(len - 2)) / h
    } else {
        (at(i + 1) - at(i - 1)) / (2.0 * h)
    }
}

/// Compute gradients, slope percent and aspect for every cell.
pub fn compute_gradient(grid: &ElevationGrid) -> GradientField {
    let (w, h) = (grid.width(), grid.height());
    let t = grid.transform();
    let n = w * h;

    let mut gradient_x = Vec::with_capacity(n);
    let mut gradient_y = Vec::with_capacity(n);
    let mut slope_pct = Vec::with_capacity(n);
    let mut aspect_deg = Vec::with_capacity(n);

    for r in 0..h {
        for c in 0..w {
            let (gx, gy) = if grid.get(r, c).is_nan() {
                (f64::NAN, f64::NAN)
            } else {
                (
                    difference(|k| grid.get(r, k) as f64, c, w, t.resx),
                    -difference(|k| grid.get(k, c) as f64, r, h, t.resy),
                )
            };
            gradient_x.push(gx);
            gradient_y.push(gy);
            slope_pct.push(gx.hypot(gy) * 100.0);
            aspect_deg.push(angles::aspect_deg(gx, gy));
        }
    }

    let field = GradientField { width: w, height: h, gradient_x, gradient_y, slope_pct, aspect_deg };
    debug!(cells = n, finite = field.finite_slopes().count(), "computed gradient field");
    field
}
