//! KML export of the current search results
//!
//! The exporter owns the record → placemark policy: which records become
//! placemarks, what they are called, and how they are styled. Markup is
//! produced with `quick-xml`.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::KmlError;
use crate::geometry::{self, Polygon, Ring};
use crate::style::ParcelStyle;
use crate::types::ParcelRecord;

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
pub const KML_MIME_TYPE: &str = "application/vnd.google-earth.kml+xml";
pub const DEFAULT_FILE_NAME: &str = "parcels.kml";
pub const DEFAULT_FOLDER_NAME: &str = "Parcels";

/// One placemark derived from a record
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: String,
    pub description: String,
    pub data: Vec<(&'static str, String)>,
    pub polygons: Vec<Polygon>,
}

impl Placemark {
    /// `None` when the record has no drawable geometry
    pub fn from_record(record: &ParcelRecord) -> Option<Self> {
        let polygons = record
            .geometry
            .as_ref()
            .map(geometry::polygons)
            .unwrap_or_default();
        if polygons.is_empty() {
            return None;
        }

        let mut data = vec![("Lot", record.lot.clone())];
        if !record.section.is_empty() {
            data.push(("Section", record.section.clone()));
        }
        data.push(("Plan", record.plan.clone()));
        data.push(("Lot/plan", record.lot_plan()));
        data.push(("Region", record.region.to_string()));

        Some(Self {
            name: placemark_name(record),
            description: record.lot_plan(),
            data,
            polygons,
        })
    }
}

/// `Lot 1 Plan RP12345`, or `Lot 2 Section 1 DP67890` when a section is known
pub fn placemark_name(record: &ParcelRecord) -> String {
    if record.section.is_empty() {
        format!("Lot {} Plan {}", record.lot, record.plan)
    } else {
        format!("Lot {} Section {} {}", record.lot, record.section, record.plan)
    }
}

/// Serializes parcel records into a styled KML document
#[derive(Debug, Clone)]
pub struct KmlExporter {
    folder_name: String,
    style: ParcelStyle,
}

impl Default for KmlExporter {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDER_NAME, ParcelStyle::default())
    }
}

impl KmlExporter {
    pub fn new(folder_name: impl Into<String>, style: ParcelStyle) -> Self {
        let folder_name = folder_name.into();
        let folder_name = if folder_name.trim().is_empty() {
            DEFAULT_FOLDER_NAME.to_string()
        } else {
            folder_name
        };
        Self { folder_name, style }
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    pub fn style(&self) -> &ParcelStyle {
        &self.style
    }

    /// Placemarks for `records`, skipping those without geometry
    pub fn placemarks(&self, records: &[ParcelRecord]) -> Vec<Placemark> {
        records.iter().filter_map(Placemark::from_record).collect()
    }

    /// Full KML document for `records`
    pub fn export(&self, records: &[ParcelRecord]) -> Result<String, KmlError> {
        let placemarks = self.placemarks(records);
        let skipped = records.len() - placemarks.len();
        if skipped > 0 {
            tracing::debug!(skipped, "Records without geometry left out of KML");
        }

        let mut kml = KmlWriter::new();
        kml.declaration()?;
        kml.open_with("kml", &[("xmlns", KML_NAMESPACE)])?;
        kml.open("Document")?;
        kml.text_element("name", &self.folder_name)?;
        kml.open("Folder")?;
        kml.text_element("name", &self.folder_name)?;

        for placemark in &placemarks {
            self.write_placemark(&mut kml, placemark)?;
        }

        kml.close("Folder")?;
        kml.close("Document")?;
        kml.close("kml")?;

        tracing::info!(placemarks = placemarks.len(), "Exported KML");
        kml.finish()
    }

    fn write_placemark(&self, kml: &mut KmlWriter, placemark: &Placemark) -> Result<(), KmlError> {
        kml.open("Placemark")?;
        kml.text_element("name", &placemark.name)?;
        kml.text_element("description", &placemark.description)?;

        kml.open("ExtendedData")?;
        for (key, value) in &placemark.data {
            kml.open_with("Data", &[("name", *key)])?;
            kml.text_element("value", value)?;
            kml.close("Data")?;
        }
        kml.close("ExtendedData")?;

        kml.open("Style")?;
        kml.open("LineStyle")?;
        kml.text_element("color", &self.style.kml_outline())?;
        kml.text_element("width", &self.style.outline_width.to_string())?;
        kml.close("LineStyle")?;
        kml.open("PolyStyle")?;
        kml.text_element("color", &self.style.kml_fill())?;
        kml.close("PolyStyle")?;
        kml.close("Style")?;

        let multi = placemark.polygons.len() > 1;
        if multi {
            kml.open("MultiGeometry")?;
        }
        for polygon in &placemark.polygons {
            write_polygon(kml, polygon)?;
        }
        if multi {
            kml.close("MultiGeometry")?;
        }

        kml.close("Placemark")
    }
}

fn write_polygon(kml: &mut KmlWriter, polygon: &Polygon) -> Result<(), KmlError> {
    let Some(outer) = polygon.outer() else {
        return Ok(());
    };
    kml.open("Polygon")?;
    write_boundary(kml, "outerBoundaryIs", outer)?;
    for hole in polygon.holes() {
        write_boundary(kml, "innerBoundaryIs", hole)?;
    }
    kml.close("Polygon")
}

fn write_boundary(kml: &mut KmlWriter, boundary: &str, ring: &Ring) -> Result<(), KmlError> {
    kml.open(boundary)?;
    kml.open("LinearRing")?;
    kml.text_element("coordinates", &coordinates_text(ring))?;
    kml.close("LinearRing")?;
    kml.close(boundary)
}

/// `lon,lat,0` triples separated by spaces, ring closed
fn coordinates_text(ring: &Ring) -> String {
    geometry::closed(ring)
        .iter()
        .map(|(lon, lat)| format!("{lon},{lat},0"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Thin event-level wrapper over `quick_xml::Writer`
struct KmlWriter {
    inner: Writer<Vec<u8>>,
}

impl KmlWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
        }
    }

    fn declaration(&mut self) -> Result<(), KmlError> {
        self.inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    fn open(&mut self, name: &str) -> Result<(), KmlError> {
        self.inner.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn open_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), KmlError> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.inner.write_event(Event::Start(start))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<(), KmlError> {
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), KmlError> {
        self.open(name)?;
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn finish(self) -> Result<String, KmlError> {
        Ok(String::from_utf8(self.inner.into_inner())?)
    }
}
