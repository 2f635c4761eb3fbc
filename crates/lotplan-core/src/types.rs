//! Wire and canonical types shared by the pipeline and the resolver service
//!
//! `RawFeature`/`RegionTag` mirror what the resolver sends back; `ParcelRecord`
//! is the one shape everything downstream of the normalizer consumes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Attribute bag of a GeoJSON feature
pub type Properties = Map<String, Value>;

// =============================================================================
// REGION TAG
// =============================================================================

/// Which jurisdiction's attribute schema a feature follows
///
/// Tags travel as upper-case strings. Anything unrecognised reads as `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RegionTag {
    Qld,
    Nsw,
    Sa,
    Vic,
    #[default]
    Other,
}

impl RegionTag {
    pub const ALL: [RegionTag; 5] = [
        RegionTag::Qld,
        RegionTag::Nsw,
        RegionTag::Sa,
        RegionTag::Vic,
        RegionTag::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionTag::Qld => "QLD",
            RegionTag::Nsw => "NSW",
            RegionTag::Sa => "SA",
            RegionTag::Vic => "VIC",
            RegionTag::Other => "OTHER",
        }
    }
}

impl From<&str> for RegionTag {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "QLD" => RegionTag::Qld,
            "NSW" => RegionTag::Nsw,
            "SA" => RegionTag::Sa,
            "VIC" => RegionTag::Vic,
            _ => RegionTag::Other,
        }
    }
}

impl fmt::Display for RegionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RegionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegionTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.as_deref().map(RegionTag::from).unwrap_or_default())
    }
}

// =============================================================================
// RESOLVER WIRE FORMAT
// =============================================================================

/// One feature as returned by the resolver
///
/// Geometry is carried opaquely (GeoJSON geometry object). Keys other than
/// `geometry` and `properties` are kept in `extra` so a feature survives a
/// pass-through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Properties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawFeature {
    pub fn new(geometry: Option<Value>, properties: Properties) -> Self {
        let mut extra = Map::new();
        extra.insert("type".to_string(), Value::String("Feature".to_string()));
        Self {
            geometry,
            properties,
            extra,
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Properties, D::Error> {
    Ok(Option::<Properties>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body sent to the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub queries: Vec<String>,
}

/// Body returned by the resolver
///
/// `regions`, when present, is index-aligned with `features`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub features: Vec<RawFeature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionTag>>,
}

// =============================================================================
// CANONICAL RECORD
// =============================================================================

/// Normalized parcel, identical in shape whatever jurisdiction it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelRecord {
    /// 1-based position in the search response
    pub id: u32,
    pub lot: String,
    pub plan: String,
    /// Empty for schemas without sections (everything except NSW-style)
    #[serde(default)]
    pub section: String,
    pub region: RegionTag,
    pub geometry: Option<Value>,
}

impl ParcelRecord {
    /// Concatenated label, e.g. `1RP912949`
    pub fn lot_plan(&self) -> String {
        format!("{}{}", self.lot, self.plan)
    }

    pub fn table_row(&self) -> TableRow {
        TableRow {
            id: self.id,
            lot: self.lot.clone(),
            plan: self.plan.clone(),
        }
    }
}

/// Row consumed by the results table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: u32,
    pub lot: String,
    pub plan: String,
}
