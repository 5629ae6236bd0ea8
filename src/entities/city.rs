// 🏙️ CityCenter Entity
// Populated places from Natural Earth (10m cultural vectors)

use super::{column_error, opt_text, text, Model, Point};
use crate::shapefile_import::{FromFeature, MappedFeature};
use chrono_tz::Tz;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCenter {
    pub name: String,

    /// Sovereign state name
    pub sov0: String,

    /// Admin-0 (country) name
    pub adm0: String,

    /// Admin-1 (state/province) name
    pub adm1: Option<String>,

    /// IANA zone id
    pub timezone: Option<String>,

    /// World city classification code
    pub worldcity: u16,

    /// Mega city classification code
    pub megacity: u16,

    pub meganame: Option<String>,

    pub geometry: Point,
}

impl CityCenter {
    pub fn tz(&self) -> Option<Tz> {
        self.timezone.as_deref().and_then(|id| id.parse::<Tz>().ok())
    }
}

impl fmt::Display for CityCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Model for CityCenter {
    const TABLE: &'static str = "city_centers";
    const COLUMNS: &'static [&'static str] = &[
        "name", "sov0", "adm0", "adm1", "timezone", "worldcity", "megacity", "meganame", "geometry",
    ];
    const ORDER_BY: &'static str = "name";
    const SCHEMA: &'static str = "CREATE TABLE IF NOT EXISTS city_centers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            sov0 TEXT NOT NULL,
            adm0 TEXT NOT NULL,
            adm1 TEXT,
            timezone TEXT,
            worldcity INTEGER NOT NULL CHECK (worldcity >= 0),
            megacity INTEGER NOT NULL CHECK (megacity >= 0),
            meganame TEXT,
            geometry TEXT NOT NULL
        )";

    fn to_row(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.sov0),
            text(&self.adm0),
            opt_text(&self.adm1),
            opt_text(&self.timezone),
            Value::Integer(self.worldcity.into()),
            Value::Integer(self.megacity.into()),
            opt_text(&self.meganame),
            Value::Text(self.geometry.to_wkt()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let wkt: String = row.get(8)?;
        let geometry = Point::from_wkt(&wkt)
            .ok_or_else(|| column_error(8, format!("not a point: {}", wkt)))?;

        Ok(CityCenter {
            name: row.get(0)?,
            sov0: row.get(1)?,
            adm0: row.get(2)?,
            adm1: row.get(3)?,
            timezone: row.get(4)?,
            worldcity: row.get(5)?,
            megacity: row.get(6)?,
            meganame: row.get(7)?,
            geometry,
        })
    }
}

impl FromFeature for CityCenter {
    fn from_feature(feature: &MappedFeature) -> Result<Self, String> {
        Ok(CityCenter {
            name: feature.text("name")?,
            sov0: feature.text("sov0")?,
            adm0: feature.text("adm0")?,
            adm1: feature.opt_text("adm1")?,
            timezone: feature.opt_text("timezone")?,
            worldcity: feature.small_uint("worldcity")?,
            megacity: feature.small_uint("megacity")?,
            meganame: feature.opt_text("meganame")?,
            geometry: feature.point("geometry")?,
        })
    }
}
