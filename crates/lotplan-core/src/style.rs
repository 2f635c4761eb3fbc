//! Parcel colour/outline settings shared by the map layer and the KML export

use serde::{Deserialize, Serialize};

pub const DEFAULT_FILL: &str = "#ff6600";
pub const DEFAULT_FILL_OPACITY: f64 = 0.7;
pub const DEFAULT_OUTLINE: &str = "#2e2e2e";
pub const DEFAULT_OUTLINE_WIDTH: f64 = 1.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelStyle {
    /// `#rrggbb`
    pub fill_hex: String,
    /// 0.0 ..= 1.0
    pub fill_opacity: f64,
    /// `#rrggbb`
    pub outline_hex: String,
    /// Pixels
    pub outline_width: f64,
}

impl Default for ParcelStyle {
    fn default() -> Self {
        Self {
            fill_hex: DEFAULT_FILL.to_string(),
            fill_opacity: DEFAULT_FILL_OPACITY,
            outline_hex: DEFAULT_OUTLINE.to_string(),
            outline_width: DEFAULT_OUTLINE_WIDTH,
        }
    }
}

impl ParcelStyle {
    pub fn kml_fill(&self) -> String {
        kml_color(&self.fill_hex, self.fill_opacity)
    }

    pub fn kml_outline(&self) -> String {
        kml_color(&self.outline_hex, 1.0)
    }

    /// Leaflet path options for the highlight layer
    pub fn leaflet(&self) -> serde_json::Value {
        serde_json::json!({
            "fillColor": self.fill_hex,
            "color": self.outline_hex,
            "weight": self.outline_width,
            "fillOpacity": self.fill_opacity.clamp(0.0, 1.0),
        })
    }
}

/// Convert `#rrggbb` + opacity into KML's `aabbggrr`
///
/// Alpha is `trunc(opacity * 255)`. The colour pairs keep the caller's case;
/// anything that is not six hex digits falls back to white.
pub fn kml_color(hex: &str, opacity: f64) -> String {
    let hex = hex.trim().trim_start_matches('#');
    let hex = if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        hex
    } else {
        "FFFFFF"
    };
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    let (r, g, b) = (&hex[0..2], &hex[2..4], &hex[4..6]);
    format!("{alpha:02x}{b}{g}{r}")
}
