//! Minimal reading of GeoJSON polygon geometry
//!
//! Records carry geometry as opaque JSON. The exporter and the highlight layer
//! only need polygon rings, so this reads `Polygon` and `MultiPolygon` and
//! treats every other shape as empty.

use serde_json::Value;

/// `(lon, lat)`
pub type Position = (f64, f64);
pub type Ring = Vec<Position>;

/// Outer ring first, holes after
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn outer(&self) -> Option<&Ring> {
        self.rings.first()
    }

    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or_default()
    }
}

/// Polygons of a GeoJSON geometry, dropping empty rings and empty polygons
pub fn polygons(geometry: &Value) -> Vec<Polygon> {
    let coordinates = geometry.get("coordinates");
    let raw_polygons: Vec<&Value> = match (geometry.get("type").and_then(Value::as_str), coordinates)
    {
        (Some("Polygon"), Some(coords)) => vec![coords],
        (Some("MultiPolygon"), Some(Value::Array(polys))) => polys.iter().collect(),
        _ => Vec::new(),
    };

    raw_polygons
        .into_iter()
        .filter_map(|poly| {
            let rings: Vec<Ring> = poly
                .as_array()?
                .iter()
                .map(read_ring)
                .filter(|ring| !ring.is_empty())
                .collect();
            (!rings.is_empty()).then_some(Polygon { rings })
        })
        .collect()
}

/// True when a record's geometry has nothing drawable
pub fn is_empty(geometry: Option<&Value>) -> bool {
    geometry.map(|g| polygons(g).is_empty()).unwrap_or(true)
}

fn read_ring(ring: &Value) -> Ring {
    ring.as_array()
        .map(|positions| positions.iter().filter_map(read_position).collect())
        .unwrap_or_default()
}

fn read_position(position: &Value) -> Option<Position> {
    let coords = position.as_array()?;
    let lon = coords.first()?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    Some((lon, lat))
}

/// Copy of `ring` with the first position appended when it is not closed
pub fn closed(ring: &Ring) -> Ring {
    let mut ring = ring.clone();
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}
