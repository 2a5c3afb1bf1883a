//! Path densification by cumulative arc length.
//!
//! Samples sit at distances `0, i, 2i, …` strictly below the path length `L`,
//! followed by the final vertex at `L`, so both endpoints are reproduced
//! exactly. Each sample carries the azimuth of the segment it lies on; a
//! sample exactly on an interior vertex belongs to the following segment.

use serde::{Deserialize, Serialize};

use crate::angles;
use crate::config::SamplePlacement;
use crate::error::SlopeError;
use crate::Result;

/// Upper bound on regular samples per path.
pub const MAX_SAMPLES_PER_PATH: usize = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Vertex {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// An identified polyline in the elevation grid's coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    pub id: String,
    pub vertices: Vec<Vertex>,
}

impl PathGeometry {
    pub fn new<V: Into<Vertex>>(id: impl Into<String>, vertices: impl IntoIterator<Item = V>) -> Self {
        Self { id: id.into(), vertices: vertices.into_iter().map(Into::into).collect() }
    }

    /// Outline of a polygon ring as a closed path. The ring is closed if its
    /// last vertex does not already repeat the first.
    pub fn closed_ring<V: Into<Vertex>>(id: impl Into<String>, ring: impl IntoIterator<Item = V>) -> Self {
        let mut path = Self::new(id, ring);
        if let (Some(&first), Some(&last)) = (path.vertices.first(), path.vertices.last()) {
            if first != last {
                path.vertices.push(first);
            }
        }
        path
    }
}

/// A densified position along a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    /// Direction of travel, degrees clockwise from North.
    pub bearing_deg: f64,
    /// Arc length from the first vertex, metres.
    pub distance_m: f64,
}

struct Segment {
    start: Vertex,
    end: Vertex,
    /// Cumulative distance at `start`.
    offset: f64,
    length: f64,
    bearing_deg: f64,
}

fn degenerate(path: &PathGeometry, reason: impl Into<String>) -> SlopeError {
    SlopeError::DegenerateGeometry { path_id: path.id.clone(), reason: reason.into() }
}

fn segments(path: &PathGeometry) -> Result<Vec<Segment>> {
    if let Some(v) = path.vertices.iter().find(|v| !(v.x.is_finite() && v.y.is_finite())) {
        return Err(degenerate(path, format!("non-finite vertex ({}, {})", v.x, v.y)));
    }

    let mut distinct: Vec<Vertex> = Vec::with_capacity(path.vertices.len());
    for &v in &path.vertices {
        if distinct.last() != Some(&v) {
            distinct.push(v);
        }
    }
    if distinct.len() < 2 {
        return Err(degenerate(
            path,
            format!("{} distinct vertices after removing duplicates, need at least 2", distinct.len()),
        ));
    }

    let mut offset = 0.0;
    let segments = distinct
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            let (dx, dy) = (end.x - start.x, end.y - start.y);
            let length = dx.hypot(dy);
            let seg = Segment { start, end, offset, length, bearing_deg: angles::azimuth_deg(dx, dy) };
            offset += length;
            seg
        })
        .collect();
    Ok(segments)
}

/// Resample `path` every `interval_m` metres of arc length.
pub fn densify(path: &PathGeometry, interval_m: f64) -> Result<Vec<SamplePoint>> {
    if !(interval_m.is_finite() && interval_m > 0.0) {
        return Err(SlopeError::Config(format!("sampling interval must be positive, got {interval_m}")));
    }
    let segments = segments(path)?;
    let last = segments.len() - 1;
    let total = segments[last].offset + segments[last].length;
    // Keeps a regular sample from landing on top of the final vertex.
    let tail_eps = 1e-9 * total.max(1.0);

    let expected = (total / interval_m).ceil();
    if !(expected <= MAX_SAMPLES_PER_PATH as f64) {
        return Err(SlopeError::Config(format!(
            "sampling interval {interval_m} m over {total} m of path '{}' exceeds {MAX_SAMPLES_PER_PATH} samples",
            path.id
        )));
    }

    let mut samples = Vec::with_capacity(expected as usize + 1);
    let mut seg = 0usize;
    let mut k = 0u64;
    loop {
        let d = k as f64 * interval_m;
        if d >= total - tail_eps {
            break;
        }
        while seg < last && d >= segments[seg + 1].offset {
            seg += 1;
        }
        let s = &segments[seg];
        let t = (d - s.offset) / s.length;
        samples.push(SamplePoint {
            x: s.start.x + t * (s.end.x - s.start.x),
            y: s.start.y + t * (s.end.y - s.start.y),
            bearing_deg: s.bearing_deg,
            distance_m: d,
        });
        k += 1;
    }

    let s = &segments[last];
    samples.push(SamplePoint { x: s.end.x, y: s.end.y, bearing_deg: s.bearing_deg, distance_m: total });
    Ok(samples)
}

/// One sample halfway between each pair of consecutive samples, heading
/// along the chord between them.
pub fn midpoints(samples: &[SamplePoint]) -> Vec<SamplePoint> {
    samples
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            let bearing_deg = if dx == 0.0 && dy == 0.0 { b.bearing_deg } else { angles::azimuth_deg(dx, dy) };
            SamplePoint {
                x: (a.x + b.x) / 2.0,
                y: (a.y + b.y) / 2.0,
                bearing_deg,
                distance_m: (a.distance_m + b.distance_m) / 2.0,
            }
        })
        .collect()
}

/// Densify and apply the configured placement.
pub fn place_samples(path: &PathGeometry, interval_m: f64, placement: SamplePlacement) -> Result<Vec<SamplePoint>> {
    let samples = densify(path, interval_m)?;
    Ok(match placement {
        SamplePlacement::Vertices => samples,
        SamplePlacement::Midpoints => midpoints(&samples),
    })
}
