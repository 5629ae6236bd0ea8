// 📍 Location Entity
// GeoLite city locations, keyed by the id used in the source CSV

use super::{column_error, opt_int, opt_text, Model, Point};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Source dataset key (not generated here)
    pub id: i64,

    /// ISO 3166-1 alpha-2 country code
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub post_code: Option<String>,
    pub metro_code: Option<i64>,
    pub area_code: Option<String>,

    pub geometry: Point,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let country = self.country.as_deref().unwrap_or("--");
        match &self.city {
            Some(city) => write!(f, "{}, {}", city, country),
            None => f.write_str(country),
        }
    }
}

impl Model for Location {
    const TABLE: &'static str = "locations";
    const COLUMNS: &'static [&'static str] = &[
        "id", "country", "region", "city", "post_code", "metro_code", "area_code", "geometry",
    ];
    const ORDER_BY: &'static str = "city";
    const SCHEMA: &'static str = "CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY,
            country TEXT,
            region TEXT,
            city TEXT,
            post_code TEXT,
            metro_code INTEGER,
            area_code TEXT,
            geometry TEXT NOT NULL
        )";

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            opt_text(&self.country),
            opt_text(&self.region),
            opt_text(&self.city),
            opt_text(&self.post_code),
            opt_int(self.metro_code),
            opt_text(&self.area_code),
            Value::Text(self.geometry.to_wkt()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let wkt: String = row.get(7)?;
        let geometry = Point::from_wkt(&wkt)
            .ok_or_else(|| column_error(7, format!("not a point: {}", wkt)))?;

        Ok(Location {
            id: row.get(0)?,
            country: row.get(1)?,
            region: row.get(2)?,
            city: row.get(3)?,
            post_code: row.get(4)?,
            metro_code: row.get(5)?,
            area_code: row.get(6)?,
            geometry,
        })
    }
}
