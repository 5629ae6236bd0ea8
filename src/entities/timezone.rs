// 🕐 TimeZone Entity
// Time zone boundaries from the tz_world shapefile
//
// Only the zone id and its boundary are stored. Area, abbreviation and UTC
// offset are looked up in the IANA database when read.

use super::{column_error, text, Model};
use crate::shapefile_import::{FromFeature, MappedFeature};
use chrono::{DateTime, Offset, Utc};
use chrono_tz::Tz;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeZone {
    /// IANA zone id, e.g. "America/New_York"
    pub tzid: String,

    /// Boundary as MULTIPOLYGON WKT
    pub geometry: String,
}

impl TimeZone {
    pub fn new(tzid: impl Into<String>, geometry: impl Into<String>) -> Self {
        TimeZone {
            tzid: tzid.into(),
            geometry: geometry.into(),
        }
    }

    /// Area name, the part of the id before the first `/`.
    pub fn area(&self) -> &str {
        self.tzid.split('/').next().unwrap_or_default()
    }

    /// IANA zone, None for ids the database does not know (e.g. "uninhabited").
    pub fn tz(&self) -> Option<Tz> {
        self.tzid.parse::<Tz>().ok()
    }

    /// Current abbreviation, empty when unknown.
    pub fn name(&self) -> String {
        self.name_at(Utc::now())
    }

    pub fn name_at(&self, at: DateTime<Utc>) -> String {
        match self.tz() {
            Some(tz) => at.with_timezone(&tz).format("%Z").to_string(),
            None => String::new(),
        }
    }

    /// Current offset from UTC as `HH:MM`, empty when unknown.
    pub fn utc_offset(&self) -> String {
        self.utc_offset_at(Utc::now())
    }

    pub fn utc_offset_at(&self, at: DateTime<Utc>) -> String {
        match self.tz() {
            Some(tz) => {
                let seconds = at.with_timezone(&tz).offset().fix().local_minus_utc();
                format_offset(seconds)
            }
            None => String::new(),
        }
    }
}

/// Seconds east of UTC → `HH:MM`, with a leading `-` west of UTC.
pub fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let minutes = seconds.unsigned_abs() / 60;
    format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tzid)
    }
}

impl Model for TimeZone {
    const TABLE: &'static str = "timezones";
    const COLUMNS: &'static [&'static str] = &["tzid", "geometry"];
    const ORDER_BY: &'static str = "tzid";
    const SCHEMA: &'static str = "CREATE TABLE IF NOT EXISTS timezones (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tzid TEXT NOT NULL CHECK (length(tzid) <= 30),
            geometry TEXT NOT NULL
        )";

    fn to_row(&self) -> Vec<Value> {
        vec![text(&self.tzid), text(&self.geometry)]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let tzid: String = row.get(0)?;
        if tzid.is_empty() {
            return Err(column_error(0, "empty tzid".to_string()));
        }
        Ok(TimeZone {
            tzid,
            geometry: row.get(1)?,
        })
    }
}

impl FromFeature for TimeZone {
    fn from_feature(feature: &MappedFeature) -> Result<Self, String> {
        Ok(TimeZone {
            tzid: feature.text("tzid")?,
            geometry: feature.geometry("geometry")?.to_wkt(),
        })
    }
}
