// 🌍 GeoLite City Parsers
// CSV rows from the GeoLite City archive → Location and NetBlock

use crate::entities::{null_if_empty, Location, NetBlock, Point};
use crate::importer::RecordParser;
use csv::StringRecord;
use std::net::Ipv4Addr;

fn field<'r>(row: &'r StringRecord, index: usize, name: &str) -> Result<&'r str, String> {
    row.get(index)
        .ok_or_else(|| format!("missing field {} ({})", index, name))
}

fn number<T: std::str::FromStr>(row: &StringRecord, index: usize, name: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    let raw = field(row, index, name)?;
    raw.trim()
        .parse::<T>()
        .map_err(|e| format!("{} {:?}: {}", name, raw, e))
}

// ============================================================================
// LOCATIONS
// ============================================================================

/// `locId,country,region,city,postalCode,latitude,longitude,metroCode,areaCode`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationParser;

impl RecordParser for LocationParser {
    type Record = StringRecord;
    type Entity = Location;

    fn parse(&self, row: &StringRecord) -> Result<Location, String> {
        if row.len() != 9 {
            return Err(format!("expected 9 fields, found {}", row.len()));
        }

        let metro_code = match field(row, 7, "metro_code")?.trim() {
            "" => None,
            _ => Some(number::<i64>(row, 7, "metro_code")?),
        };

        let latitude: f64 = number(row, 5, "latitude")?;
        let longitude: f64 = number(row, 6, "longitude")?;

        Ok(Location {
            id: number(row, 0, "id")?,
            country: null_if_empty(field(row, 1, "country")?),
            region: null_if_empty(field(row, 2, "region")?),
            city: null_if_empty(field(row, 3, "city")?),
            post_code: null_if_empty(field(row, 4, "post_code")?),
            metro_code,
            area_code: null_if_empty(field(row, 8, "area_code")?),
            geometry: Point::new(longitude, latitude),
        })
    }
}

// ============================================================================
// BLOCKS
// ============================================================================

/// 32-bit integer → dotted quad.
pub fn ip(value: u32) -> Ipv4Addr {
    Ipv4Addr::from(value)
}

/// `startIpNum,endIpNum,locId`
#[derive(Debug, Clone, Copy, Default)]
pub struct NetBlockParser;

impl RecordParser for NetBlockParser {
    type Record = StringRecord;
    type Entity = NetBlock;

    fn parse(&self, row: &StringRecord) -> Result<NetBlock, String> {
        if row.len() != 3 {
            return Err(format!("expected 3 fields, found {}", row.len()));
        }

        Ok(NetBlock {
            start: ip(number(row, 0, "start")?),
            end: ip(number(row, 1, "end")?),
            location_id: number(row, 2, "location_id")?,
        })
    }
}
