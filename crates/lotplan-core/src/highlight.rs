//! Map highlight layer built from a result snapshot
//!
//! The map widget is an external collaborator; this produces what it needs:
//! a GeoJSON FeatureCollection of the highlighted parcels, path styling and
//! the bounds to fit the view to.

use serde::Serialize;
use serde_json::{json, Value};

use crate::geometry;
use crate::style::ParcelStyle;
use crate::types::ParcelRecord;

/// `[[min_lat, min_lon], [max_lat, max_lon]]`
pub type Bounds = [[f64; 2]; 2];

/// View used when nothing has coordinates (eastern Australia)
pub const DEFAULT_BOUNDS: Bounds = [[-39.0, 137.0], [-9.0, 155.0]];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightLayer {
    pub features: Value,
    pub style: Value,
    pub bounds: Bounds,
}

impl HighlightLayer {
    pub fn new(records: &[ParcelRecord], style: &ParcelStyle) -> Self {
        Self {
            features: feature_collection(records),
            style: style.leaflet(),
            bounds: bounds(records),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features["features"]
            .as_array()
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Records with geometry as a GeoJSON FeatureCollection
pub fn feature_collection(records: &[ParcelRecord]) -> Value {
    let features: Vec<Value> = records
        .iter()
        .filter(|r| !geometry::is_empty(r.geometry.as_ref()))
        .map(|r| {
            json!({
                "type": "Feature",
                "geometry": r.geometry,
                "properties": {
                    "id": r.id,
                    "lot": r.lot,
                    "plan": r.plan,
                    "region": r.region,
                },
            })
        })
        .collect();

    json!({"type": "FeatureCollection", "features": features})
}

/// Bounding box over every polygon ring, or `DEFAULT_BOUNDS`
pub fn bounds(records: &[ParcelRecord]) -> Bounds {
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;

    let positions = records
        .iter()
        .filter_map(|r| r.geometry.as_ref())
        .flat_map(geometry::polygons)
        .flat_map(|p| p.rings)
        .flatten();

    for (lon, lat) in positions {
        min_lat = min_lat.min(lat);
        max_lat = max_lat.max(lat);
        min_lon = min_lon.min(lon);
        max_lon = max_lon.max(lon);
    }

    if min_lat > max_lat || min_lon > max_lon {
        return DEFAULT_BOUNDS;
    }
    [[min_lat, min_lon], [max_lat, max_lon]]
}
