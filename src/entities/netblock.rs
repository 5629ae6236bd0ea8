// 🌐 NetBlock Entity
// IPv4 ranges pointing at a Location

use super::{column_error, Model};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetBlock {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,

    /// Foreign key to locations.id (rows go when the location goes)
    pub location_id: i64,
}

impl NetBlock {
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.start <= addr && addr <= self.end
    }
}

impl fmt::Display for NetBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

fn address(row: &Row<'_>, index: usize) -> rusqlite::Result<Ipv4Addr> {
    let raw: String = row.get(index)?;
    raw.parse()
        .map_err(|_| column_error(index, format!("not an IPv4 address: {}", raw)))
}

impl Model for NetBlock {
    const TABLE: &'static str = "net_blocks";
    // start_num is the sort key; dotted text does not sort numerically
    const COLUMNS: &'static [&'static str] = &["start_ip", "end_ip", "location_id", "start_num"];
    const ORDER_BY: &'static str = "start_num, id";
    const SCHEMA: &'static str = "CREATE TABLE IF NOT EXISTS net_blocks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_ip TEXT NOT NULL,
            end_ip TEXT NOT NULL,
            location_id INTEGER NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
            start_num INTEGER NOT NULL
        )";

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Text(self.start.to_string()),
            Value::Text(self.end.to_string()),
            Value::Integer(self.location_id),
            Value::Integer(i64::from(u32::from(self.start))),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(NetBlock {
            start: address(row, 0)?,
            end: address(row, 1)?,
            location_id: row.get(2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_display() {
        let block = NetBlock {
            start: Ipv4Addr::new(192, 168, 0, 0),
            end: Ipv4Addr::new(192, 168, 0, 255),
            location_id: 7,
        };

        assert!(block.contains(Ipv4Addr::new(192, 168, 0, 1)));
        assert!(!block.contains(Ipv4Addr::new(192, 168, 1, 0)));
        assert_eq!(block.to_string(), "192.168.0.0 - 192.168.0.255");
    }
}
