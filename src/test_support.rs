// Shared fixtures for unit tests

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Write a ZIP archive holding the given (name, content) members
pub fn write_zip<C: AsRef<[u8]>>(path: &Path, members: &[(&str, C)]) {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default();
        for (name, content) in members {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_ref()).unwrap();
        }
        zip.finish().unwrap();
    }
    fs::write(path, buf).unwrap();
}

/// tz_world layout: one unit square per zone id, side by side, with a TZID
/// attribute. Writes `shp` plus its .shx and .dbf.
pub fn write_timezones(shp: &Path, zones: &[&str]) {
    let table = TableWriterBuilder::new().add_character_field(FieldName::try_from("TZID").unwrap(), 40);
    let mut writer = shapefile::Writer::from_path(shp, table).unwrap();

    for (i, zone) in zones.iter().enumerate() {
        let x = i as f64;
        let square = Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, 0.0),
            Point::new(x, 1.0),
            Point::new(x + 1.0, 1.0),
            Point::new(x + 1.0, 0.0),
            Point::new(x, 0.0),
        ]));

        let mut record = Record::default();
        record.insert("TZID".to_string(), FieldValue::Character(Some(zone.to_string())));
        writer.write_shape_and_record(&square, &record).unwrap();
    }
}

/// Zip `shp` and its sidecar files under `folder/` in the archive
pub fn zip_shapefile(archive: &Path, shp: &Path, folder: &str) {
    let members: Vec<(String, Vec<u8>)> = ["shp", "shx", "dbf"]
        .iter()
        .map(|ext| {
            let file = shp.with_extension(ext);
            let name = file.file_name().unwrap().to_string_lossy().into_owned();
            (format!("{}/{}", folder, name), fs::read(&file).unwrap())
        })
        .collect();

    let members: Vec<(&str, &[u8])> = members
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .collect();
    write_zip(archive, &members);
}
