// Entity Models
// One flat table per reference dataset, fully replaced on every import
//
// Each entity knows:
// - Its table name, insert columns and CREATE TABLE statement
// - How to turn itself into a row of SQLite values and back

pub mod geometry;
pub mod timezone;
pub mod city;
pub mod location;
pub mod netblock;
pub mod fedwire;

pub use geometry::{Geometry, Point};
pub use timezone::TimeZone;
pub use city::CityCenter;
pub use location::Location;
pub use netblock::NetBlock;
pub use fedwire::FedWireInfo;

use rusqlite::types::Value;
use rusqlite::Row;

/// Model - table mapping for a persisted entity
pub trait Model: Sized {
    /// Table name
    const TABLE: &'static str;

    /// Columns written on insert, in `to_row()` order
    const COLUMNS: &'static [&'static str];

    /// Default listing order
    const ORDER_BY: &'static str;

    /// CREATE TABLE statement
    const SCHEMA: &'static str;

    /// Values for COLUMNS
    fn to_row(&self) -> Vec<Value>;

    /// Rebuild from a row selected with COLUMNS
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Every table, parents before children.
pub const SCHEMAS: &[&str] = &[
    TimeZone::SCHEMA,
    CityCenter::SCHEMA,
    Location::SCHEMA,
    NetBlock::SCHEMA,
    FedWireInfo::SCHEMA,
];

// ============================================================================
// ROW HELPERS
// ============================================================================

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

pub(crate) fn opt_int(value: Option<i64>) -> Value {
    match value {
        Some(n) => Value::Integer(n),
        None => Value::Null,
    }
}

/// Conversion failure while reading column `index`
pub(crate) fn column_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

/// Empty string → None
pub fn null_if_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
