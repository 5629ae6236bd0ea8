// 📖 Readers
// Turn a loader payload into a one-shot sequence of raw records

use crate::error::{ImportError, Result};
use crate::loader::Payload;
use std::io::BufRead;

/// Lazy, single-pass record sequence.
pub type Records<R> = Box<dyn Iterator<Item = Result<R>>>;

/// Raw records know when they carry nothing (blank line, empty row).
pub trait RawRecord {
    fn is_blank(&self) -> bool;
}

impl RawRecord for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl RawRecord for csv::StringRecord {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// RecordReader - how a payload becomes raw records
pub trait RecordReader {
    type Record: RawRecord;

    fn get_reader(&self, data: Payload) -> Result<Records<Self::Record>>;
}

// ============================================================================
// LINE READER
// ============================================================================

/// Split buffered text on `\n`. For streams prefer FileReader.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineReader;

impl RecordReader for LineReader {
    type Record = String;

    fn get_reader(&self, data: Payload) -> Result<Records<String>> {
        let text = data.into_text()?;
        let lines: Vec<String> = text.split('\n').map(String::from).collect();
        Ok(Box::new(lines.into_iter().map(Ok)))
    }
}

// ============================================================================
// FILE READER
// ============================================================================

/// Iterate the lines of a stream as they are read.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReader;

impl RecordReader for FileReader {
    type Record = String;

    fn get_reader(&self, data: Payload) -> Result<Records<String>> {
        let lines = data.into_stream().lines().map(|line| line.map_err(ImportError::from));
        Ok(Box::new(lines))
    }
}

// ============================================================================
// CSV READER
// ============================================================================

/// Named CSV conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Comma separated, double-quote quoting
    #[default]
    Excel,
    /// Tab separated, double-quote quoting
    ExcelTab,
    /// Comma separated, `\n` line endings only
    Unix,
}

impl Dialect {
    fn builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.has_headers(false).flexible(true).quote(b'"').double_quote(true);

        match self {
            Dialect::Excel => {
                builder.delimiter(b',');
            }
            Dialect::ExcelTab => {
                builder.delimiter(b'\t');
            }
            Dialect::Unix => {
                builder.delimiter(b',').terminator(csv::Terminator::Any(b'\n'));
            }
        }
        builder
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReader {
    pub dialect: Dialect,
}

impl CsvReader {
    pub fn new(dialect: Dialect) -> Self {
        CsvReader { dialect }
    }
}

impl RecordReader for CsvReader {
    type Record = csv::StringRecord;

    fn get_reader(&self, data: Payload) -> Result<Records<csv::StringRecord>> {
        let reader = self.dialect.builder().from_reader(data.into_stream());
        let rows = reader
            .into_records()
            .map(|row| row.map_err(ImportError::from));
        Ok(Box::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(text: &str) -> Payload {
        Payload::Stream(Box::new(Cursor::new(text.as_bytes().to_vec())))
    }

    #[test]
    fn test_line_reader_keeps_trailing_empty_line() {
        let lines: Vec<String> = LineReader
            .get_reader(Payload::Text("a\nb\n".to_string()))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(lines, vec!["a", "b", ""]);
        assert!(lines[2].is_blank());
    }

    #[test]
    fn test_file_reader_strips_newlines() {
        let lines: Vec<String> = FileReader
            .get_reader(stream("first\r\nsecond\n"))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_csv_excel_quoting() {
        let rows: Vec<csv::StringRecord> = CsvReader::default()
            .get_reader(stream("1,\"US\",\"\",\"New York, NY\"\n2,\"FR\"\n"))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][3], "New York, NY");
        assert_eq!(&rows[0][2], "");
        assert_eq!(rows[1].len(), 2, "rows may vary in length");
    }

    #[test]
    fn test_csv_tab_dialect() {
        let rows: Vec<csv::StringRecord> = CsvReader::new(Dialect::ExcelTab)
            .get_reader(Payload::Text("a\tb,c\n".to_string()))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows[0].len(), 2);
        assert_eq!(&rows[0][1], "b,c");
    }

    #[test]
    fn test_reader_is_single_pass() {
        let mut records = LineReader.get_reader(Payload::Text("x".to_string())).unwrap();
        assert!(records.next().is_some());
        assert!(records.next().is_none());
    }
}
