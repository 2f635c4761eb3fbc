//! Zipped ESRI shapefile export of the current search results
//!
//! One Polygon shape per record with geometry, carrying `LOT`, `SEC` and
//! `PLAN` attributes, in WGS84 lon/lat. The `.shp`, `.shx` and `.dbf` files
//! are encoded here; the archive is built with `zip`.
//!
//! Byte order follows the format: file and record headers are big-endian,
//! shape content and the `.dbf` are little-endian.

use std::io::{Cursor, Write};

use chrono::{Datelike, NaiveDate};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ShapefileError;
use crate::geometry::{self, Position, Ring};
use crate::types::ParcelRecord;

pub const SHAPEFILE_MIME_TYPE: &str = "application/zip";
pub const DEFAULT_FILE_NAME: &str = "parcels.zip";
pub const DEFAULT_BASE_NAME: &str = "parcels";

/// Geographic WGS84 (EPSG:4326)
pub const WGS84_PRJ: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

pub const ENCODING: &str = "UTF-8";

/// Attribute columns, all character fields: (name, width in bytes)
pub const FIELDS: [(&str, u8); 3] = [("LOT", 20), ("SEC", 10), ("PLAN", 20)];

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const POLYGON: i32 = 5;
const HEADER_BYTES: usize = 100;
const RECORD_HEADER_BYTES: usize = 8;

const DBF_VERSION: u8 = 0x03;
const DBF_HEADER_TERMINATOR: u8 = 0x0D;
const DBF_EOF: u8 = 0x1A;

/// Contents of each file in the shapefile set
#[derive(Debug, Clone, PartialEq)]
pub struct ShapefileDataset {
    pub shp: Vec<u8>,
    pub shx: Vec<u8>,
    pub dbf: Vec<u8>,
    pub prj: String,
    pub cpg: String,
}

impl ShapefileDataset {
    /// `(extension, bytes)` in archive order
    pub fn files(&self) -> [(&'static str, &[u8]); 5] {
        [
            ("shp", self.shp.as_slice()),
            ("shx", self.shx.as_slice()),
            ("dbf", self.dbf.as_slice()),
            ("prj", self.prj.as_bytes()),
            ("cpg", self.cpg.as_bytes()),
        ]
    }
}

/// Serializes parcel records into a zipped shapefile
#[derive(Debug, Clone)]
pub struct ShapefileExporter {
    base_name: String,
    updated: NaiveDate,
}

impl Default for ShapefileExporter {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_NAME)
    }
}

impl ShapefileExporter {
    /// `base_name` names the files inside the archive; blank falls back to `parcels`
    pub fn new(base_name: impl Into<String>) -> Self {
        let base_name = base_name.into();
        let base_name = match base_name.trim() {
            "" => DEFAULT_BASE_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            base_name,
            updated: chrono::Local::now().date_naive(),
        }
    }

    /// Last-update date written to the `.dbf` header
    pub fn with_date(mut self, updated: NaiveDate) -> Self {
        self.updated = updated;
        self
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Encoded files for `records`, skipping those without geometry
    pub fn dataset(&self, records: &[ParcelRecord]) -> Result<ShapefileDataset, ShapefileError> {
        let shapes: Vec<ShapeRecord> = records.iter().filter_map(ShapeRecord::from_record).collect();
        let skipped = records.len() - shapes.len();
        if skipped > 0 {
            tracing::debug!(skipped, "Records without geometry left out of shapefile");
        }

        let (shp, shx) = encode_geometry(&shapes)?;
        let dbf = encode_attributes(&shapes, self.updated)?;
        Ok(ShapefileDataset {
            shp,
            shx,
            dbf,
            prj: WGS84_PRJ.to_string(),
            cpg: ENCODING.to_string(),
        })
    }

    /// Zip archive holding `<base>.shp`, `.shx`, `.dbf`, `.prj` and `.cpg`
    pub fn export(&self, records: &[ParcelRecord]) -> Result<Vec<u8>, ShapefileError> {
        let dataset = self.dataset(records)?;
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (extension, bytes) in dataset.files() {
            zip.start_file(format!("{}.{extension}", self.base_name), options)?;
            zip.write_all(bytes)?;
        }
        let archive = zip.finish()?.into_inner();

        tracing::info!(
            shapes = dataset.shx.len().saturating_sub(HEADER_BYTES) / RECORD_HEADER_BYTES,
            bytes = archive.len(),
            "Exported shapefile"
        );
        Ok(archive)
    }
}

/// A record reduced to what the shapefile stores
#[derive(Debug, Clone, PartialEq)]
struct ShapeRecord {
    lot: String,
    section: String,
    plan: String,
    /// Closed rings; outer rings clockwise, holes counter-clockwise
    parts: Vec<Ring>,
    bbox: BoundingBox,
}

impl ShapeRecord {
    fn from_record(record: &ParcelRecord) -> Option<Self> {
        let polygons = geometry::polygons(record.geometry.as_ref()?);
        let parts: Vec<Ring> = polygons
            .iter()
            .flat_map(|polygon| {
                polygon.outer().map(|outer| oriented(outer, true)).into_iter().chain(
                    polygon.holes().iter().map(|hole| oriented(hole, false)),
                )
            })
            .collect();
        let bbox = BoundingBox::of(parts.iter().flatten())?;

        Some(Self {
            lot: record.lot.clone(),
            section: record.section.clone(),
            plan: record.plan.clone(),
            parts,
            bbox,
        })
    }

    fn point_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    /// Polygon record content, without the record header
    fn content(&self) -> Result<Vec<u8>, ShapefileError> {
        let points = self.point_count();
        let mut buf = Vec::with_capacity(44 + 4 * self.parts.len() + 16 * points);
        buf.extend_from_slice(&POLYGON.to_le_bytes());
        self.bbox.write_le(&mut buf);
        buf.extend_from_slice(&to_i32(self.parts.len(), "part count")?.to_le_bytes());
        buf.extend_from_slice(&to_i32(points, "point count")?.to_le_bytes());

        let mut start = 0;
        for part in &self.parts {
            buf.extend_from_slice(&to_i32(start, "part index")?.to_le_bytes());
            start += part.len();
        }
        for (x, y) in self.parts.iter().flatten() {
            buf.extend_from_slice(&x.to_le_bytes());
            buf.extend_from_slice(&y.to_le_bytes());
        }
        Ok(buf)
    }

    fn attributes(&self) -> [&str; 3] {
        [&self.lot, &self.section, &self.plan]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundingBox {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

impl BoundingBox {
    const EMPTY: BoundingBox = BoundingBox {
        xmin: 0.0,
        ymin: 0.0,
        xmax: 0.0,
        ymax: 0.0,
    };

    fn of<'a>(points: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        points.into_iter().fold(None, |bbox, &(x, y)| {
            let point = BoundingBox {
                xmin: x,
                ymin: y,
                xmax: x,
                ymax: y,
            };
            Some(match bbox {
                Some(bbox) => point.union(bbox),
                None => point,
            })
        })
    }

    fn union(self, other: BoundingBox) -> Self {
        Self {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    fn write_le(&self, buf: &mut Vec<u8>) {
        for value in [self.xmin, self.ymin, self.xmax, self.ymax] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Twice the signed area; positive for counter-clockwise rings
fn signed_area(ring: &Ring) -> f64 {
    ring.windows(2)
        .map(|pair| pair[0].0 * pair[1].1 - pair[1].0 * pair[0].1)
        .sum()
}

/// Closed copy of `ring` wound clockwise or counter-clockwise
fn oriented(ring: &Ring, clockwise: bool) -> Ring {
    let mut ring = geometry::closed(ring);
    let area = signed_area(&ring);
    if (clockwise && area > 0.0) || (!clockwise && area < 0.0) {
        ring.reverse();
    }
    ring
}

/// `.shp` and `.shx` contents
fn encode_geometry(shapes: &[ShapeRecord]) -> Result<(Vec<u8>, Vec<u8>), ShapefileError> {
    let mut records = Vec::new();
    let mut index = Vec::new();

    for (position, shape) in shapes.iter().enumerate() {
        let content = shape.content()?;
        let content_words = to_words(content.len(), ".shp record")?;

        index.extend_from_slice(&to_words(HEADER_BYTES + records.len(), ".shp")?.to_be_bytes());
        index.extend_from_slice(&content_words.to_be_bytes());

        records.extend_from_slice(&to_i32(position + 1, "record number")?.to_be_bytes());
        records.extend_from_slice(&content_words.to_be_bytes());
        records.extend_from_slice(&content);
    }

    let bbox = shapes
        .iter()
        .map(|shape| shape.bbox)
        .reduce(BoundingBox::union)
        .unwrap_or(BoundingBox::EMPTY);

    let mut shp = file_header(to_words(HEADER_BYTES + records.len(), ".shp")?, &bbox);
    shp.extend_from_slice(&records);
    let mut shx = file_header(to_words(HEADER_BYTES + index.len(), ".shx")?, &bbox);
    shx.extend_from_slice(&index);
    Ok((shp, shx))
}

/// 100-byte header shared by `.shp` and `.shx`
fn file_header(length_words: i32, bbox: &BoundingBox) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_BYTES);
    buf.extend_from_slice(&FILE_CODE.to_be_bytes());
    buf.extend_from_slice(&[0; 20]);
    buf.extend_from_slice(&length_words.to_be_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&POLYGON.to_le_bytes());
    bbox.write_le(&mut buf);
    // Z and M ranges
    buf.extend_from_slice(&[0; 32]);
    buf
}

/// dBase III table, one row per shape
fn encode_attributes(shapes: &[ShapeRecord], updated: NaiveDate) -> Result<Vec<u8>, ShapefileError> {
    let header_len = 32 + 32 * FIELDS.len() + 1;
    let record_len = 1 + FIELDS.iter().map(|(_, width)| usize::from(*width)).sum::<usize>();

    let mut buf = Vec::with_capacity(header_len + record_len * shapes.len() + 1);
    buf.push(DBF_VERSION);
    buf.push(u8::try_from(updated.year() - 1900).unwrap_or(0));
    buf.push(u8::try_from(updated.month()).unwrap_or(0));
    buf.push(u8::try_from(updated.day()).unwrap_or(0));
    buf.extend_from_slice(&u32::try_from(shapes.len()).map_err(too_large(".dbf rows"))?.to_le_bytes());
    buf.extend_from_slice(&u16::try_from(header_len).map_err(too_large(".dbf header"))?.to_le_bytes());
    buf.extend_from_slice(&u16::try_from(record_len).map_err(too_large(".dbf row"))?.to_le_bytes());
    buf.extend_from_slice(&[0; 20]);

    for (name, width) in FIELDS {
        let mut descriptor = [0u8; 32];
        descriptor[..name.len()].copy_from_slice(name.as_bytes());
        descriptor[11] = b'C';
        descriptor[16] = width;
        buf.extend_from_slice(&descriptor);
    }
    buf.push(DBF_HEADER_TERMINATOR);

    for shape in shapes {
        // not deleted
        buf.push(b' ');
        for ((_, width), value) in FIELDS.iter().zip(shape.attributes()) {
            buf.extend_from_slice(&fixed_width(value, usize::from(*width)));
        }
    }
    buf.push(DBF_EOF);
    Ok(buf)
}

/// `value` space-padded to `width` bytes, cut at a char boundary when longer
fn fixed_width(value: &str, width: usize) -> Vec<u8> {
    let mut end = value.len().min(width);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut field = value.as_bytes()[..end].to_vec();
    field.resize(width, b' ');
    field
}

fn too_large<E>(part: &'static str) -> impl FnOnce(E) -> ShapefileError {
    move |_| ShapefileError::TooLarge { part }
}

fn to_i32(value: usize, part: &'static str) -> Result<i32, ShapefileError> {
    i32::try_from(value).map_err(too_large(part))
}

/// Byte length as 16-bit words
fn to_words(bytes: usize, part: &'static str) -> Result<i32, ShapefileError> {
    to_i32(bytes / 2, part)
}
