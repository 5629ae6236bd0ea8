// 🏦 FedWireInfo Entity
// U.S. bank routing directory from the Federal Reserve (FedWire)
//
// Record layout: https://www.frbservices.org/EPaymentsDirectory/fpddir.txt

use super::{column_error, opt_text, text, Model};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FedWireInfo {
    /// Routing number, unique
    pub bank_code: i64,

    /// Telegraphic name (18 chars)
    pub telex_name: String,

    /// Customer name (36 chars)
    pub bank_name: String,

    pub state: Option<String>,
    pub city: String,

    pub funds_transfer_elegible: bool,
    pub funds_settlement_only: bool,
    /// Book-entry securities transfer
    pub bes_transfer_elegible: bool,

    /// Date of last revision
    pub modified: Option<NaiveDate>,
}

impl FedWireInfo {
    /// Routing code for U.S. accounts, zero padded to nine digits.
    pub fn routing_code(&self) -> String {
        format!("{:09}", self.bank_code)
    }
}

impl fmt::Display for FedWireInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.bank_name, self.city)
    }
}

impl Model for FedWireInfo {
    const TABLE: &'static str = "fedwire_infos";
    const COLUMNS: &'static [&'static str] = &[
        "bank_code",
        "telex_name",
        "bank_name",
        "state",
        "city",
        "funds_transfer_elegible",
        "funds_settlement_only",
        "bes_transfer_elegible",
        "modified",
    ];
    const ORDER_BY: &'static str = "bank_code";
    const SCHEMA: &'static str = "CREATE TABLE IF NOT EXISTS fedwire_infos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bank_code INTEGER NOT NULL UNIQUE,
            telex_name TEXT NOT NULL,
            bank_name TEXT NOT NULL,
            state TEXT,
            city TEXT NOT NULL,
            funds_transfer_elegible INTEGER NOT NULL DEFAULT 0,
            funds_settlement_only INTEGER NOT NULL DEFAULT 0,
            bes_transfer_elegible INTEGER NOT NULL DEFAULT 0,
            modified TEXT
        )";

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.bank_code),
            text(&self.telex_name),
            text(&self.bank_name),
            opt_text(&self.state),
            text(&self.city),
            Value::Integer(self.funds_transfer_elegible.into()),
            Value::Integer(self.funds_settlement_only.into()),
            Value::Integer(self.bes_transfer_elegible.into()),
            match self.modified {
                Some(date) => Value::Text(date.format(DATE_FORMAT).to_string()),
                None => Value::Null,
            },
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let modified: Option<String> = row.get(8)?;
        let modified = modified
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                    .map_err(|e| column_error(8, format!("bad date {}: {}", raw, e)))
            })
            .transpose()?;

        Ok(FedWireInfo {
            bank_code: row.get(0)?,
            telex_name: row.get(1)?,
            bank_name: row.get(2)?,
            state: row.get(3)?,
            city: row.get(4)?,
            funds_transfer_elegible: row.get(5)?,
            funds_settlement_only: row.get(6)?,
            bes_transfer_elegible: row.get(7)?,
            modified,
        })
    }
}
