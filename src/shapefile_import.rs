// 🧭 Shapefile Importer
// Map ESRI shapefile features straight into rows, skipping reader and parser
//
// A LayerMapping pairs entity field names with either a .dbf attribute label
// or a geometry label (POINT, POLYGON, MULTIPOLYGON, LINESTRING). Each feature
// becomes a MappedFeature, and the entity builds itself from that.

use crate::db::EntityStore;
use crate::entities::geometry::Ring;
use crate::entities::{Geometry, Point};
use crate::error::{ImportError, Result};
use crate::importer::{pipeline, ImportSummary};
use crate::loader::DataSource;
use chrono::NaiveDate;
use log::{info, warn};
use shapefile::dbase::{self, FieldValue as DbfValue};
use shapefile::{PolygonRing, Shape};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;

/// Rows per insert transaction
const SAVE_CHUNK: usize = 1000;

// ============================================================================
// MAPPING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    /// POLYGON and MULTIPOLYGON both land here; polygons are promoted
    MultiPolygon,
}

impl GeometryKind {
    fn from_label(label: &str) -> Option<GeometryKind> {
        match label {
            "POINT" => Some(GeometryKind::Point),
            "LINESTRING" => Some(GeometryKind::LineString),
            "POLYGON" | "MULTIPOLYGON" => Some(GeometryKind::MultiPolygon),
            _ => None,
        }
    }

    fn accepts(&self, geometry: &Geometry) -> bool {
        matches!(
            (self, geometry),
            (GeometryKind::Point, Geometry::Point(_))
                | (GeometryKind::LineString, Geometry::LineString(_))
                | (GeometryKind::MultiPolygon, Geometry::MultiPolygon(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Attribute(String),
    Geometry(GeometryKind),
}

/// Entity field name → feature attribute or geometry.
#[derive(Debug, Clone)]
pub struct LayerMapping {
    fields: Vec<(String, Source)>,
}

impl LayerMapping {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let fields = pairs
            .iter()
            .map(|(field, label)| {
                let source = match GeometryKind::from_label(label) {
                    Some(kind) => Source::Geometry(kind),
                    None => Source::Attribute(label.to_string()),
                };
                (field.to_string(), source)
            })
            .collect();

        LayerMapping { fields }
    }

    pub fn fields(&self) -> &[(String, Source)] {
        &self.fields
    }
}

// ============================================================================
// MAPPED FEATURE
// ============================================================================

/// Attribute value after conversion from dBase.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Date(NaiveDate),
    Geometry(Geometry),
}

/// One feature, keyed by entity field name.
#[derive(Debug, Clone, Default)]
pub struct MappedFeature {
    values: HashMap<String, Value>,
}

impl MappedFeature {
    pub fn insert(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn opt_text(&self, field: &str) -> Result<Option<String>, String> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) if s.is_empty() => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(Value::Integer(n)) => Ok(Some(n.to_string())),
            Some(Value::Real(f)) => Ok(Some(f.to_string())),
            Some(other) => Err(format!("field '{}' is not text: {:?}", field, other)),
        }
    }

    pub fn text(&self, field: &str) -> Result<String, String> {
        self.opt_text(field)?
            .ok_or_else(|| format!("field '{}' is empty", field))
    }

    pub fn small_uint(&self, field: &str) -> Result<u16, String> {
        let number = match self.get(field) {
            Some(Value::Integer(n)) => *n as f64,
            Some(Value::Real(f)) => *f,
            Some(Value::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("field '{}': {}", field, e))?,
            other => return Err(format!("field '{}' is not a number: {:?}", field, other)),
        };

        if number.fract() != 0.0 || number < 0.0 || number > u16::MAX as f64 {
            return Err(format!("field '{}' out of range: {}", field, number));
        }
        Ok(number as u16)
    }

    pub fn geometry(&self, field: &str) -> Result<&Geometry, String> {
        match self.get(field) {
            Some(Value::Geometry(g)) => Ok(g),
            _ => Err(format!("field '{}' has no geometry", field)),
        }
    }

    pub fn point(&self, field: &str) -> Result<Point, String> {
        match self.geometry(field)? {
            Geometry::Point(p) => Ok(*p),
            other => Err(format!("field '{}' is a {}, not a POINT", field, other.kind())),
        }
    }
}

/// Entities that can be built from a mapped shapefile feature.
pub trait FromFeature: Sized {
    fn from_feature(feature: &MappedFeature) -> Result<Self, String>;
}

// ============================================================================
// CONVERSION
// ============================================================================

fn convert_value(value: &DbfValue) -> Value {
    match value {
        DbfValue::Character(Some(s)) => Value::Text(s.trim().to_string()),
        DbfValue::Memo(s) => Value::Text(s.trim().to_string()),
        DbfValue::Numeric(Some(n)) => Value::Real(*n),
        DbfValue::Float(Some(f)) => Value::Real(f64::from(*f)),
        DbfValue::Double(d) => Value::Real(*d),
        DbfValue::Currency(c) => Value::Real(*c),
        DbfValue::Integer(i) => Value::Integer(i64::from(*i)),
        DbfValue::Logical(Some(b)) => Value::Bool(*b),
        DbfValue::Date(Some(d)) => NaiveDate::from_ymd_opt(d.year() as i32, d.month(), d.day())
            .map(Value::Date)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn multipolygon<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Point) -> Geometry {
    let mut polygons: Vec<Vec<Ring>> = Vec::new();

    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => {
                polygons.push(vec![points.iter().map(&xy).collect()]);
            }
            PolygonRing::Inner(points) => {
                let hole: Ring = points.iter().map(&xy).collect();
                match polygons.last_mut() {
                    Some(polygon) => polygon.push(hole),
                    None => polygons.push(vec![hole]),
                }
            }
        }
    }

    Geometry::MultiPolygon(polygons)
}

/// Shape → Geometry (x/y only, no reprojection).
pub fn convert_shape(shape: &Shape) -> Result<Geometry, String> {
    let geometry = match shape {
        Shape::Point(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointM(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointZ(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::Polygon(polygon) => multipolygon(polygon.rings(), |p| Point::new(p.x, p.y)),
        Shape::PolygonM(polygon) => multipolygon(polygon.rings(), |p| Point::new(p.x, p.y)),
        Shape::PolygonZ(polygon) => multipolygon(polygon.rings(), |p| Point::new(p.x, p.y)),
        Shape::Polyline(line) => match line.parts().as_slice() {
            [part] => Geometry::LineString(part.iter().map(|p| Point::new(p.x, p.y)).collect()),
            parts => return Err(format!("polyline with {} parts", parts.len())),
        },
        Shape::NullShape => return Err("empty geometry".to_string()),
        other => return Err(format!("unsupported shape type {:?}", other.shapetype())),
    };

    Ok(geometry)
}

/// Apply `mapping` to one feature.
pub fn map_feature(
    mapping: &LayerMapping,
    shape: &Shape,
    record: &dbase::Record,
) -> Result<MappedFeature, String> {
    let mut feature = MappedFeature::default();

    for (field, source) in mapping.fields() {
        let value = match source {
            Source::Attribute(label) => {
                let raw = record
                    .get(label)
                    .ok_or_else(|| format!("no attribute '{}'", label))?;
                convert_value(raw)
            }
            Source::Geometry(kind) => {
                let geometry = convert_shape(shape)?;
                if !kind.accepts(&geometry) {
                    return Err(format!(
                        "field '{}' expects {:?}, feature has {}",
                        field,
                        kind,
                        geometry.kind()
                    ));
                }
                Value::Geometry(geometry)
            }
        };
        feature.insert(field, value);
    }

    Ok(feature)
}

// ============================================================================
// IMPORTER
// ============================================================================

/// ShapefileImporter - alternate terminal strategy for geometry datasets
#[derive(Debug, Clone)]
pub struct ShapefileImporter {
    pub mapping: LayerMapping,

    /// Abort on the first feature that cannot be mapped
    pub strict: bool,

    /// Log every saved feature
    pub verbose: bool,
}

impl ShapefileImporter {
    pub fn new(mapping: LayerMapping) -> Self {
        ShapefileImporter {
            mapping,
            strict: true,
            verbose: true,
        }
    }

    /// Read `path` (with its .dbf beside it) and save every mapped feature.
    ///
    /// Returns (features saved, batches written).
    pub fn load<E, St>(&self, path: &Path, store: &mut St) -> Result<(usize, usize)>
    where
        E: FromFeature + Display,
        St: EntityStore<E> + ?Sized,
    {
        info!("Importing features from {}", path.display());
        let mut reader = shapefile::Reader::from_path(path)?;

        let mut saved = 0;
        let mut batches = 0;
        let mut skipped = 0;
        let mut pending: Vec<E> = Vec::with_capacity(SAVE_CHUNK);

        for (index, item) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = item?;

            let entity = map_feature(&self.mapping, &shape, &record).and_then(|f| E::from_feature(&f));
            match entity {
                Ok(entity) => {
                    if self.verbose {
                        info!("Saved: {}", entity);
                    }
                    pending.push(entity);
                }
                Err(message) if self.strict => {
                    return Err(ImportError::Feature { index, message });
                }
                Err(message) => {
                    warn!("Skipping feature {}: {}", index, message);
                    skipped += 1;
                }
            }

            if pending.len() >= SAVE_CHUNK {
                saved += store.insert_batch(&pending)?;
                batches += 1;
                pending.clear();
            }
        }

        if !pending.is_empty() {
            saved += store.insert_batch(&pending)?;
            batches += 1;
        }

        info!("Imported {} features ({} skipped)", saved, skipped);
        Ok((saved, batches))
    }

    /// Resolve the .shp through `source`, optionally wipe, load, clean up.
    pub fn run<E, S, St>(&self, source: &mut S, store: &mut St, wipe: bool) -> Result<ImportSummary>
    where
        E: FromFeature + Display,
        S: DataSource + ?Sized,
        St: EntityStore<E> + ?Sized,
    {
        pipeline(
            source,
            store,
            wipe,
            |source| source.get_file(),
            |path, store| self.load::<E, St>(&path, store),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fetch_all, setup_database, SqliteStore};
    use crate::entities::{CityCenter, TimeZone};
    use crate::test_support::write_timezones;
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn record(pairs: &[(&str, DbfValue)]) -> dbase::Record {
        let mut record = dbase::Record::default();
        for (name, value) in pairs {
            record.insert(name.to_string(), value.clone());
        }
        record
    }

    fn text(s: &str) -> DbfValue {
        DbfValue::Character(Some(s.to_string()))
    }

    fn city_mapping() -> LayerMapping {
        LayerMapping::new(&[
            ("name", "NAME"),
            ("sov0", "SOV0NAME"),
            ("adm0", "ADM0NAME"),
            ("adm1", "ADM1NAME"),
            ("timezone", "TIMEZONE"),
            ("geometry", "POINT"),
            ("worldcity", "WORLDCITY"),
            ("megacity", "MEGACITY"),
            ("meganame", "MEGANAME"),
        ])
    }

    fn lisbon() -> dbase::Record {
        record(&[
            ("NAME", text("Lisbon")),
            ("SOV0NAME", text("Portugal")),
            ("ADM0NAME", text("Portugal")),
            ("ADM1NAME", text("Lisboa")),
            ("TIMEZONE", text("Europe/Lisbon")),
            ("WORLDCITY", DbfValue::Numeric(Some(1.0))),
            ("MEGACITY", DbfValue::Numeric(Some(0.0))),
            ("MEGANAME", DbfValue::Character(None)),
        ])
    }

    #[test]
    fn test_mapping_labels() {
        let mapping = LayerMapping::new(&[("tzid", "TZID"), ("geometry", "POLYGON")]);
        assert_eq!(mapping.fields()[0].1, Source::Attribute("TZID".to_string()));
        assert_eq!(mapping.fields()[1].1, Source::Geometry(GeometryKind::MultiPolygon));
    }

    #[test]
    fn test_city_feature() {
        let shape = Shape::Point(shapefile::Point::new(-9.1449, 38.7252));
        let feature = map_feature(&city_mapping(), &shape, &lisbon()).unwrap();
        let city = CityCenter::from_feature(&feature).unwrap();

        assert_eq!(city.name, "Lisbon");
        assert_eq!(city.adm1.as_deref(), Some("Lisboa"));
        assert_eq!(city.timezone.as_deref(), Some("Europe/Lisbon"));
        assert_eq!(city.worldcity, 1);
        assert_eq!(city.megacity, 0);
        assert_eq!(city.meganame, None);
        assert_eq!(city.geometry, Point::new(-9.1449, 38.7252));
    }

    #[test]
    fn test_missing_attribute_is_reported() {
        let shape = Shape::Point(shapefile::Point::new(0.0, 0.0));
        let result = map_feature(&city_mapping(), &shape, &record(&[("NAME", text("X"))]));

        assert!(result.unwrap_err().contains("no attribute"));
    }

    #[test]
    fn test_wrong_geometry_is_reported() {
        let mapping = LayerMapping::new(&[("geometry", "POLYGON")]);
        let shape = Shape::Point(shapefile::Point::new(0.0, 0.0));

        let err = map_feature(&mapping, &shape, &record(&[])).unwrap_err();
        assert!(err.contains("POINT"));
    }

    #[test]
    fn test_polygon_promoted_to_multipolygon() {
        let outer = vec![
            shapefile::Point::new(0.0, 0.0),
            shapefile::Point::new(0.0, 10.0),
            shapefile::Point::new(10.0, 10.0),
            shapefile::Point::new(10.0, 0.0),
            shapefile::Point::new(0.0, 0.0),
        ];
        let polygon = shapefile::Polygon::new(PolygonRing::Outer(outer));
        let shape = Shape::Polygon(polygon);

        let mapping = LayerMapping::new(&[("tzid", "TZID"), ("geometry", "POLYGON")]);
        let feature = map_feature(&mapping, &shape, &record(&[("TZID", text("Europe/Paris"))])).unwrap();
        let zone = TimeZone::from_feature(&feature).unwrap();

        assert_eq!(zone.tzid, "Europe/Paris");
        assert!(zone.geometry.starts_with("MULTIPOLYGON ((("));
    }

    #[test]
    fn test_small_uint_rejects_fractions() {
        let mut feature = MappedFeature::default();
        feature.insert("worldcity", Value::Real(1.5));
        feature.insert("megacity", Value::Integer(2));

        assert!(feature.small_uint("worldcity").is_err());
        assert_eq!(feature.small_uint("megacity"), Ok(2));
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn tz_importer(strict: bool) -> ShapefileImporter {
        ShapefileImporter {
            strict,
            verbose: false,
            ..ShapefileImporter::new(LayerMapping::new(&[("tzid", "TZID"), ("geometry", "POLYGON")]))
        }
    }

    #[test]
    fn test_strict_load_aborts_on_unmappable_feature() {
        let dir = TempDir::new().unwrap();
        let shp = dir.path().join("tz_world.shp");
        write_timezones(&shp, &["Europe/Paris", "", "Asia/Tokyo"]);

        let conn = memory_db();
        let mut store = SqliteStore::<TimeZone>::new(&conn);
        let err = tz_importer(true).load::<TimeZone, _>(&shp, &mut store).unwrap_err();

        match &err {
            ImportError::Feature { index, message } => {
                assert_eq!(*index, 1);
                assert!(message.contains("tzid"), "{}", message);
            }
            other => panic!("expected a feature error, got {:?}", other),
        }
        assert_eq!(err.exit_code(), 8);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_lax_load_skips_unmappable_feature() {
        let dir = TempDir::new().unwrap();
        let shp = dir.path().join("tz_world.shp");
        write_timezones(&shp, &["Europe/Paris", "", "Asia/Tokyo"]);

        let conn = memory_db();
        let mut store = SqliteStore::<TimeZone>::new(&conn);
        let (saved, batches) = tz_importer(false).load::<TimeZone, _>(&shp, &mut store).unwrap();

        assert_eq!((saved, batches), (2, 1));
        let mut zones: Vec<String> = fetch_all::<TimeZone>(&conn, None)
            .unwrap()
            .into_iter()
            .map(|zone| zone.tzid)
            .collect();
        zones.sort();
        assert_eq!(zones, vec!["Asia/Tokyo", "Europe/Paris"]);
    }

    #[test]
    fn test_load_saves_in_chunks() {
        let dir = TempDir::new().unwrap();
        let shp = dir.path().join("zones.shp");
        let names: Vec<String> = (0..SAVE_CHUNK + 1).map(|i| format!("Zone/{}", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        write_timezones(&shp, &names);

        let conn = memory_db();
        let mut store = SqliteStore::<TimeZone>::new(&conn);
        let (saved, batches) = tz_importer(true).load::<TimeZone, _>(&shp, &mut store).unwrap();

        assert_eq!((saved, batches), (SAVE_CHUNK + 1, 2));
        assert_eq!(store.count().unwrap(), (SAVE_CHUNK + 1) as i64);
    }
}
