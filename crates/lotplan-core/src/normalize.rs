//! Region-aware normalization of resolver features into `ParcelRecord`s
//!
//! Each jurisdiction publishes lot and plan under different attribute names.
//! `PropertySchema::for_region` is the single table mapping a `RegionTag` to
//! those names; supporting a new jurisdiction means adding one arm there.

use serde_json::Value;

use crate::dispatch::TaggedFeatures;
use crate::types::{ParcelRecord, Properties, RawFeature, RegionTag};

/// Attribute keys holding lot, plan and section for one jurisdiction
///
/// A field made of several keys is their values concatenated in order
/// (South Australia splits type letter and number into separate columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySchema {
    pub lot: &'static [&'static str],
    pub plan: &'static [&'static str],
    pub section: &'static [&'static str],
}

const QLD_SCHEMA: PropertySchema = PropertySchema {
    lot: &["lot"],
    plan: &["plan"],
    section: &[],
};

/// NSW cadastre layout, also the fallback for untagged features
const NSW_SCHEMA: PropertySchema = PropertySchema {
    lot: &["lotnumber"],
    plan: &["planlabel"],
    section: &["sectionnumber"],
};

const SA_SCHEMA: PropertySchema = PropertySchema {
    lot: &["parcel_t", "parcel"],
    plan: &["plan_t", "plan"],
    section: &[],
};

const VIC_SCHEMA: PropertySchema = PropertySchema {
    lot: &["parcel_lot_number"],
    plan: &["parcel_plan_number"],
    section: &[],
};

impl PropertySchema {
    pub fn for_region(region: RegionTag) -> &'static PropertySchema {
        match region {
            RegionTag::Qld => &QLD_SCHEMA,
            RegionTag::Nsw | RegionTag::Other => &NSW_SCHEMA,
            RegionTag::Sa => &SA_SCHEMA,
            RegionTag::Vic => &VIC_SCHEMA,
        }
    }

    pub fn lot(&self, properties: &Properties) -> String {
        read_field(properties, self.lot)
    }

    pub fn plan(&self, properties: &Properties) -> String {
        read_field(properties, self.plan)
    }

    pub fn section(&self, properties: &Properties) -> String {
        read_field(properties, self.section)
    }
}

fn read_field(properties: &Properties, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| properties.get(*key).map(value_text).unwrap_or_default())
        .collect()
}

/// Attribute value as text, strings verbatim. Null and structured values read as empty.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Normalize one feature at response position `index` (0-based)
pub fn normalize_feature(index: usize, feature: &RawFeature, region: RegionTag) -> ParcelRecord {
    let schema = PropertySchema::for_region(region);
    ParcelRecord {
        id: record_id(index),
        lot: schema.lot(&feature.properties),
        plan: schema.plan(&feature.properties),
        section: schema.section(&feature.properties),
        region,
        geometry: feature.geometry.clone(),
    }
}

/// 1-based id for response position `index`, saturating at `u32::MAX`
pub fn record_id(index: usize) -> u32 {
    u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX)
}

/// Normalize a whole response, ids `1..=n` in response order
pub fn normalize(tagged: &TaggedFeatures) -> Vec<ParcelRecord> {
    tagged
        .pairs()
        .enumerate()
        .map(|(index, (feature, region))| normalize_feature(index, feature, region))
        .collect()
}
