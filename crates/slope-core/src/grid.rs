use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SlopeError;
use crate::Result;

/// North-up affine placement of a raster in a projected, metre-based CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// x of the west edge of column 0.
    pub origin_x: f64,
    /// y of the north edge of row 0.
    pub origin_y: f64,
    /// Pixel width in metres.
    pub resx: f64,
    /// Pixel height in metres (positive; rows run southwards).
    pub resy: f64,
}

impl GeoTransform {
    /// Unit-spaced transform with its north-west corner at `(0, height)`, so
    /// the grid covers `[0, width] × [0, height]`.
    pub fn unit(height: usize) -> Self {
        Self { origin_x: 0.0, origin_y: height as f64, resx: 1.0, resy: 1.0 }
    }
}

/// One decoded raster band, as handed over by a format decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBand {
    /// Row-major samples, north row first.
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    /// Sentinel marking missing cells, if the source declares one.
    pub nodata: Option<f32>,
}

/// Anything that can yield a single elevation band.
///
/// [`ElevationGrid::load`] takes the source by value and drops it before
/// returning, so any file or buffer it holds is released on every path.
pub trait BandSource {
    fn read_band(self) -> Result<RasterBand>;
}

impl BandSource for RasterBand {
    fn read_band(self) -> Result<RasterBand> {
        Ok(self)
    }
}

/// Validated elevation grid in metres, row-major, nodata as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    data: Vec<f32>,
    width: usize,
    height: usize,
    transform: GeoTransform,
}

impl ElevationGrid {
    /// Read a band from `source` and validate it.
    pub fn load<S: BandSource>(source: S) -> Result<Self> {
        let band = source.read_band()?;
        Self::from_band(band)
    }

    /// Validate a decoded band and convert nodata cells to NaN.
    pub fn from_band(band: RasterBand) -> Result<Self> {
        let RasterBand { mut data, width, height, transform, nodata } = band;

        if data.is_empty() || width == 0 || height == 0 {
            return Err(SlopeError::Data("elevation band is empty".into()));
        }
        if data.len() != width * height {
            return Err(SlopeError::Data(format!(
                "band holds {} values but is declared {width}×{height}",
                data.len()
            )));
        }
        if width < 2 || height < 2 {
            return Err(SlopeError::Data(format!(
                "grid {width}×{height} is too small for finite differences (need at least 2×2)"
            )));
        }
        for (name, res) in [("resx", transform.resx), ("resy", transform.resy)] {
            if !(res.is_finite() && res > 0.0) {
                return Err(SlopeError::Data(format!("pixel spacing {name} must be positive, got {res}")));
            }
        }
        if !(transform.origin_x.is_finite() && transform.origin_y.is_finite()) {
            return Err(SlopeError::Data("grid origin is not finite".into()));
        }

        let mut finite = 0usize;
        for v in data.iter_mut() {
            if !v.is_finite() || nodata.is_some_and(|nd| *v == nd) {
                *v = f32::NAN;
            } else {
                finite += 1;
            }
        }
        if finite == 0 {
            return Err(SlopeError::Data("elevation band has no finite cells".into()));
        }

        debug!(width, height, finite, resx = transform.resx, resy = transform.resy, "loaded elevation grid");
        Ok(Self { data, width, height, transform })
    }

    /// Build a grid from a closure `z(row, col)` on a unit-spaced transform.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Result<Self> {
        Self::from_fn_with(width, height, GeoTransform::unit(height), f)
    }

    /// Build a grid from a closure `z(row, col)` with an explicit transform.
    pub fn from_fn_with(
        width: usize,
        height: usize,
        transform: GeoTransform,
        f: impl Fn(usize, usize) -> f32,
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(width * height);
        for r in 0..height {
            for c in 0..width {
                data.push(f(r, c));
            }
        }
        Self::from_band(RasterBand { data, width, height, transform, nodata: None })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of non-nodata cells.
    pub fn finite_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    /// `(min_x, max_x, min_y, max_y)` of the outer cell edges.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let t = &self.transform;
        let max_x = t.origin_x + self.width as f64 * t.resx;
        let min_y = t.origin_y - self.height as f64 * t.resy;
        (t.origin_x, max_x, min_y, t.origin_y)
    }

    /// Fractional pixel position `(col, row)` of a world point, measured from
    /// the north-west grid corner in pixel units (cell `(r, c)` spans
    /// `[c, c+1) × [r, r+1)`). `None` outside the extent; the east and south
    /// outer edges count as inside.
    pub fn pixel_position(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let (min_x, max_x, min_y, max_y) = self.extent();
        if x < min_x || x > max_x || y < min_y || y > max_y {
            return None;
        }
        let t = &self.transform;
        let col = ((x - t.origin_x) / t.resx).clamp(0.0, self.width as f64);
        let row = ((t.origin_y - y) / t.resy).clamp(0.0, self.height as f64);
        Some((col, row))
    }

    /// Cell containing a world point.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.pixel_position(x, y)?;
        let c = (col.floor() as usize).min(self.width - 1);
        let r = (row.floor() as usize).min(self.height - 1);
        Some((r, c))
    }

    /// World coordinates of the centre of cell `(row, col)`.
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let t = &self.transform;
        (
            t.origin_x + (col as f64 + 0.5) * t.resx,
            t.origin_y - (row as f64 + 0.5) * t.resy,
        )
    }
}
