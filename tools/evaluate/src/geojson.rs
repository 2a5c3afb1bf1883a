//! GeoJSON FeatureCollection → [`PathGeometry`] list.
//!
//! LineStrings are paths as-is; each part of a MultiLineString becomes its
//! own path. Polygons contribute their exterior ring as a closed path, so
//! plazas and walkway footprints are checked along their outline. Other
//! geometry types are skipped.

use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use slope_core::{PathGeometry, Vertex};
use tracing::warn;

type Position = Vec<f64>;

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    #[serde(other)]
    Unsupported,
}

/// Identifier: `properties.path_id`, `properties.id`, the feature id, or the
/// feature's index in the collection.
fn feature_id(feature: &Feature, index: usize) -> String {
    let from_props = feature
        .properties
        .as_ref()
        .and_then(|p| p.get("path_id").or_else(|| p.get("id")))
        .filter(|v| !v.is_null());
    match from_props.or(feature.id.as_ref()) {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => index.to_string(),
    }
}

fn vertices(id: &str, positions: &[Position]) -> Result<Vec<Vertex>> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Vertex { x: *x, y: *y }),
            _ => bail!("feature '{id}': position {p:?} has fewer than two coordinates"),
        })
        .collect()
}

/// Parse a FeatureCollection into paths, in document order.
pub fn parse_paths(text: &str) -> Result<Vec<PathGeometry>> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    let mut paths = Vec::new();

    for (index, feature) in collection.features.iter().enumerate() {
        let id = feature_id(feature, index);
        let part = |k: usize| format!("{id}#{k}");
        match &feature.geometry {
            Some(Geometry::LineString { coordinates }) => {
                paths.push(PathGeometry::new(id.clone(), vertices(&id, coordinates)?));
            }
            Some(Geometry::MultiLineString { coordinates }) => {
                for (k, line) in coordinates.iter().enumerate() {
                    paths.push(PathGeometry::new(part(k), vertices(&id, line)?));
                }
            }
            Some(Geometry::Polygon { coordinates }) => {
                if let Some(exterior) = coordinates.first() {
                    paths.push(PathGeometry::closed_ring(id.clone(), vertices(&id, exterior)?));
                }
            }
            Some(Geometry::MultiPolygon { coordinates }) => {
                for (k, polygon) in coordinates.iter().enumerate() {
                    if let Some(exterior) = polygon.first() {
                        paths.push(PathGeometry::closed_ring(part(k), vertices(&id, exterior)?));
                    }
                }
            }
            Some(Geometry::Unsupported) | None => {
                warn!(feature = %id, "skipping feature without a line or polygon geometry");
            }
        }
    }
    Ok(paths)
}
