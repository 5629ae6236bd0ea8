// 🏦 FedWire Directory Parser
// Fixed-width routing directory records → FedWireInfo
//
// Layout (0-based character offsets):
//   0..9     routing number
//   9..27    telegraphic name
//   27..63   customer name
//   63..65   state
//   65..90   city
//   90       funds transfer status ('Y')
//   91       funds settlement-only status ('S')
//   92       book-entry securities transfer status ('Y')
//   93..101  date of last revision (YYYYMMDD)

use crate::entities::{null_if_empty, FedWireInfo};
use crate::importer::RecordParser;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, Default)]
pub struct FedWireParser;

/// Characters `start..end` of the line, cut short when the line is.
fn slice(line: &[char], start: usize, end: usize) -> String {
    let end = end.min(line.len());
    let start = start.min(end);
    line[start..end].iter().collect()
}

fn flag(line: &[char], index: usize) -> Result<char, String> {
    line.get(index)
        .copied()
        .ok_or_else(|| format!("line is {} characters, no flag at {}", line.len(), index))
}

/// Upper-case the first letter of each word, lower-case the rest.
pub fn capwords(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl RecordParser for FedWireParser {
    type Record = String;
    type Entity = FedWireInfo;

    fn parse(&self, raw: &String) -> Result<FedWireInfo, String> {
        let line: Vec<char> = raw.chars().collect();
        let line = line.as_slice();

        let code = slice(line, 0, 9);
        let bank_code = code
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("routing number {:?}: {}", code, e))?;

        let revised = slice(line, 93, 101);
        let revised = revised.trim();
        let modified = if revised.is_empty() {
            None
        } else {
            let date = NaiveDate::parse_from_str(revised, "%Y%m%d")
                .map_err(|e| format!("revision date {:?}: {}", revised, e))?;
            Some(date)
        };

        Ok(FedWireInfo {
            bank_code,
            telex_name: slice(line, 9, 27).trim().to_string(),
            bank_name: slice(line, 27, 63).trim().to_string(),
            state: null_if_empty(slice(line, 63, 65).trim()),
            city: capwords(slice(line, 65, 90).trim()),
            funds_transfer_elegible: flag(line, 90)? == 'Y',
            funds_settlement_only: flag(line, 91)? == 'S',
            bes_transfer_elegible: flag(line, 92)? == 'Y',
            modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay the fields out at their fixed offsets
    fn record(code: &str, telex: &str, name: &str, state: &str, city: &str, flags: &str, date: &str) -> String {
        format!(
            "{:<9}{:<18}{:<36}{:<2}{:<25}{:<3}{}",
            code, telex, name, state, city, flags, date
        )
    }

    #[test]
    fn test_parse_full_record() {
        let line = record(
            "011000015",
            "FRB BOS",
            "FEDERAL RESERVE BANK OF BOSTON",
            "MA",
            "BOSTON",
            "YNY",
            "20040910",
        );
        assert_eq!(line.len(), 101);

        let info = FedWireParser.parse(&line).unwrap();

        assert_eq!(info.bank_code, 11000015);
        assert_eq!(info.routing_code(), "011000015");
        assert_eq!(info.telex_name, "FRB BOS");
        assert_eq!(info.bank_name, "FEDERAL RESERVE BANK OF BOSTON");
        assert_eq!(info.state.as_deref(), Some("MA"));
        assert_eq!(info.city, "Boston");
        assert!(info.funds_transfer_elegible);
        assert!(!info.funds_settlement_only);
        assert!(info.bes_transfer_elegible);
        assert_eq!(info.modified, NaiveDate::from_ymd_opt(2004, 9, 10));
    }

    #[test]
    fn test_all_flags_set() {
        let line = record("000000001", "TEST", "TEST BANK", "CA", "FRESNO", "YSY", "");
        let info = FedWireParser.parse(&line).unwrap();

        assert_eq!(info.bank_code, 1);
        assert_eq!(info.routing_code(), "000000001");
        assert_eq!(info.state.as_deref(), Some("CA"));
        assert!(info.funds_transfer_elegible);
        assert!(info.funds_settlement_only);
        assert!(info.bes_transfer_elegible);
    }

    #[test]
    fn test_offsets_count_characters() {
        let line = record(
            "021000021",
            "BCO ESPAÑOL",
            "BANCO ESPAÑOL DE CRÉDITO",
            "NY",
            "NEW YORK",
            "NSY",
            "20120131",
        );
        assert_eq!(line.chars().count(), 101);
        assert!(line.len() > 101);

        let info = FedWireParser.parse(&line).unwrap();
        assert_eq!(info.telex_name, "BCO ESPAÑOL");
        assert_eq!(info.bank_name, "BANCO ESPAÑOL DE CRÉDITO");
        assert_eq!(info.state.as_deref(), Some("NY"));
        assert_eq!(info.city, "New York");
        assert!(!info.funds_transfer_elegible);
        assert!(info.funds_settlement_only);
        assert!(info.bes_transfer_elegible);
        assert_eq!(info.modified, NaiveDate::from_ymd_opt(2012, 1, 31));
    }

    #[test]
    fn test_parse_blank_date_and_state() {
        let line = record("026009593", "BK AMER NYC", "BANK OF AMERICA, N.A.", "", "NEW YORK", "YSN", "");
        let info = FedWireParser.parse(&line).unwrap();

        assert_eq!(info.state, None);
        assert_eq!(info.city, "New York");
        assert!(info.funds_settlement_only);
        assert!(!info.bes_transfer_elegible);
        assert_eq!(info.modified, None);
    }

    #[test]
    fn test_trailing_carriage_return_is_ignored() {
        let mut line = record("011000015", "FRB BOS", "FRB", "MA", "BOSTON", "YNY", "20040910");
        line.push('\r');

        let info = FedWireParser.parse(&line).unwrap();
        assert_eq!(info.modified, NaiveDate::from_ymd_opt(2004, 9, 10));
    }

    #[test]
    fn test_truncated_line_fails_on_flags() {
        let line = record("011000015", "FRB BOS", "FRB", "MA", "BOSTON", "", "");
        let line = line.trim_end().to_string();

        let err = FedWireParser.parse(&line).unwrap_err();
        assert!(err.contains("no flag at 90"), "{}", err);
    }

    #[test]
    fn test_bad_routing_number() {
        let line = record("01100001X", "FRB BOS", "FRB", "MA", "BOSTON", "YNY", "");
        assert!(FedWireParser.parse(&line).unwrap_err().contains("routing number"));
    }

    #[test]
    fn test_capwords() {
        assert_eq!(capwords("SAN  FRANCISCO"), "San Francisco");
        assert_eq!(capwords("o'fallon"), "O'fallon");
        assert_eq!(capwords(""), "");
    }
}
