//! CSV reading into schema-less [`Row`]s.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::LoaderResult;
use crate::processing::prepare_headers;
use crate::types::{Row, Value, TIMESTAMP_FIELD};

/// Cell texts read as missing values.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Streaming row iterator over a CSV source with a header row.
///
/// Rules:
///
/// - Headers are deduplicated and sanitized (see [`prepare_headers`]); `timestamp_field` is
///   reserved for the normalized timestamp.
/// - Invalid UTF-8 is replaced rather than rejected.
/// - Records with more fields than the header are skipped with a warning; records with fewer
///   fields get null for the missing columns.
/// - Each cell's type is inferred on its own (see [`parse_cell`]).
pub struct CsvRows<R> {
    reader: csv::Reader<R>,
    raw_headers: Vec<String>,
    headers: Vec<String>,
    record: csv::ByteRecord,
    skipped: usize,
}

/// Open a CSV file for row streaming.
pub fn open_csv(path: impl AsRef<Path>) -> LoaderResult<CsvRows<File>> {
    let file = File::open(path)?;
    csv_rows_from_reader(file)
}

/// Stream rows from any CSV byte source.
pub fn csv_rows_from_reader<R: Read>(source: R) -> LoaderResult<CsvRows<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let raw_headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    let headers = prepare_headers(&raw_headers, &[TIMESTAMP_FIELD]);

    Ok(CsvRows {
        reader,
        raw_headers,
        headers,
        record: csv::ByteRecord::new(),
        skipped: 0,
    })
}

impl<R> CsvRows<R> {
    /// Header as it appears in the file.
    pub fn raw_headers(&self) -> &[String] {
        &self.raw_headers
    }

    /// Field names used for documents, position-aligned with [`Self::raw_headers`].
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of malformed records skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: Read> Iterator for CsvRows<R> {
    type Item = LoaderResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_byte_record(&mut self.record) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
            }

            if self.record.len() > self.headers.len() {
                let line = self.record.position().map_or(0, |p| p.line());
                tracing::warn!(
                    line,
                    expected = self.headers.len(),
                    found = self.record.len(),
                    "skipping malformed csv line"
                );
                self.skipped += 1;
                continue;
            }

            let fields = self
                .headers
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = self
                        .record
                        .get(i)
                        .map_or(Value::Null, |raw| parse_cell(&String::from_utf8_lossy(raw)));
                    (name.clone(), value)
                })
                .collect();
            return Some(Ok(Row::from_unique(fields)));
        }
    }
}

/// Infer a typed value from one cell.
///
/// NA tokens become null, `true`/`false` become booleans, integers and floats (including
/// `inf`/`-inf`) become numbers, and anything else is kept as the original string.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if NA_TOKENS.contains(&trimmed) {
        return Value::Null;
    }
    match trimmed {
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return Value::Float(v);
    }
    Value::Str(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_cell;
    use crate::types::Value;

    #[test]
    fn cells_are_typed_individually() {
        assert_eq!(parse_cell(""), Value::Null);
        assert_eq!(parse_cell("NaN"), Value::Null);
        assert_eq!(parse_cell("N/A"), Value::Null);
        assert_eq!(parse_cell("True"), Value::Bool(true));
        assert_eq!(parse_cell(" 42 "), Value::Int(42));
        assert_eq!(parse_cell("-1.5"), Value::Float(-1.5));
        assert_eq!(parse_cell("1e3"), Value::Float(1000.0));
        assert_eq!(parse_cell("hello world"), Value::Str("hello world".to_string()));
    }

    #[test]
    fn infinities_stay_floats_until_cleaned() {
        assert_eq!(parse_cell("inf"), Value::Float(f64::INFINITY));
        assert_eq!(parse_cell("-Infinity"), Value::Float(f64::NEG_INFINITY));
    }
}
