//! Compass-angle helpers shared by the gradient engine and slope evaluator.
//!
//! Every angle in this crate is in degrees, clockwise from North (+y), in
//! `[0°, 360°)`. The frame is (east, north) = (+x, +y).

/// Wrap any finite angle into `[0°, 360°)`.
#[inline]
pub fn normalize_deg(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Compass azimuth of the vector `(dx, dy)` in the (east, north) frame.
///
/// `azimuth_deg(0, 1) = 0` (N), `azimuth_deg(1, 0) = 90` (E).
/// A zero vector has no direction; it returns 0.
#[inline]
pub fn azimuth_deg(dx: f64, dy: f64) -> f64 {
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    normalize_deg(dx.atan2(dy).to_degrees())
}

/// Aspect: azimuth of steepest descent, i.e. of `(−dz/dx, −dz/dy)`.
#[inline]
pub fn aspect_deg(dz_dx: f64, dz_dy: f64) -> f64 {
    azimuth_deg(-dz_dx, -dz_dy)
}

/// `|sin(a − b)|` for two compass angles: the share of a slope that lies
/// across a direction of travel.
#[inline]
pub fn cross_factor(aspect_deg: f64, bearing_deg: f64) -> f64 {
    (aspect_deg - bearing_deg).to_radians().sin().abs()
}

/// Gradient component along a compass bearing: `gx·sin(b) + gy·cos(b)`.
#[inline]
pub fn directional_derivative(dz_dx: f64, dz_dy: f64, bearing_deg: f64) -> f64 {
    let b = bearing_deg.to_radians();
    dz_dx * b.sin() + dz_dy * b.cos()
}
