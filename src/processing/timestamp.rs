//! Timestamp column resolution and value normalization.
//!
//! Numeric values are interpreted as Unix epoch offsets. No unit is given in the input, so the
//! unit is picked by magnitude: an integer part of 13 or more digits (`v >= 1e12`) is treated as
//! milliseconds, anything smaller as seconds. Values close to the boundary (second-epoch values
//! around year 33658, millisecond values around 2001-09-09) are ambiguous by construction.
//! A value of exactly `1e12` counts as milliseconds; a strict `v > 1e12` test would read it as
//! seconds instead.
//!
//! Instants outside years 0000..=9999 are rejected: the store's default `date` format cannot
//! hold an expanded year, and a document carrying one is refused as a whole.
//!
//! Everything else goes through a flexible text parse (RFC 3339 / ISO-8601, RFC 2822 and a list
//! of common textual layouts). Values without a zone are taken as UTC.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::error::{LoaderResult, TimestampParseError};
use crate::interaction::{ColumnChoice, ColumnSample, Prompter, TimestampPreview};
use crate::types::{NormalizedInstant, Row, Value};

/// Column-name terms checked in order when guessing the timestamp column.
pub const TIMESTAMP_COLUMN_PRIORITY: [&str; 5] =
    ["timestamp", "@timestamp", "time", "datetime", "date"];

const MILLIS_THRESHOLD: f64 = 1e12;

const MAX_YEAR: i32 = 9999;

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("numeric pattern is valid"));

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%d/%b/%Y:%H:%M:%S %z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%a %b %d %H:%M:%S %Y",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Guess which column holds timestamps.
///
/// Checks every column against the first priority term before moving to the next term, so
/// `["date", "event_time"]` yields `event_time`. Matching is a case-insensitive substring test.
pub fn guess_column<S: AsRef<str>>(columns: &[S]) -> Option<&str> {
    TIMESTAMP_COLUMN_PRIORITY.iter().find_map(|term| {
        columns
            .iter()
            .map(AsRef::as_ref)
            .find(|col| col.to_lowercase().contains(term))
    })
}

/// Normalize a raw value into a UTC instant, logging and dropping values that cannot be parsed.
pub fn normalize(value: &Value) -> Option<NormalizedInstant> {
    match try_normalize(value) {
        Ok(instant) => instant,
        Err(err) => {
            tracing::warn!(raw = %err.raw, reason = %err.reason, "failed to parse timestamp");
            None
        }
    }
}

/// Normalize a raw value into a UTC instant.
///
/// Returns `Ok(None)` for null/blank values and an error when the value is present but is not a
/// recognizable epoch offset or date string.
pub fn try_normalize(value: &Value) -> Result<Option<NormalizedInstant>, TimestampParseError> {
    let instant = match value {
        Value::Null => return Ok(None),
        Value::Int(v) => from_epoch_int(*v, &value.to_string())?,
        Value::Float(v) => from_epoch_float(*v, &value.to_string())?,
        Value::Str(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if NUMERIC.is_match(trimmed) {
                match trimmed.parse::<i64>() {
                    Ok(v) => from_epoch_int(v, trimmed)?,
                    Err(_) => {
                        let v = trimmed.parse::<f64>().map_err(|e| parse_error(trimmed, e))?;
                        from_epoch_float(v, trimmed)?
                    }
                }
            } else {
                parse_text(trimmed)?
            }
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            return Err(parse_error(&value.to_string(), "not a date or epoch value"));
        }
    };
    if !(0..=MAX_YEAR).contains(&instant.year()) {
        return Err(parse_error(
            value.to_string().trim(),
            format!("year {} is outside 0000..=9999", instant.year()),
        ));
    }
    Ok(Some(NormalizedInstant::new(
        instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    )))
}

fn from_epoch_int(v: i64, raw: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    let instant = if v as f64 >= MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(v)
    } else {
        DateTime::from_timestamp(v, 0)
    };
    instant.ok_or_else(|| parse_error(raw, "epoch value out of range"))
}

fn from_epoch_float(v: f64, raw: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    if !v.is_finite() {
        return Err(parse_error(raw, "not a finite number"));
    }
    // Microsecond resolution; finer digits of a float epoch are noise.
    let micros = (if v >= MILLIS_THRESHOLD { v * 1e3 } else { v * 1e6 }).round();
    if micros.abs() >= i64::MAX as f64 {
        return Err(parse_error(raw, "epoch value out of range"));
    }
    DateTime::from_timestamp_micros(micros as i64)
        .ok_or_else(|| parse_error(raw, "epoch value out of range"))
}

fn parse_text(raw: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }
    }
    Err(parse_error(raw, "no known date/time layout matched"))
}

fn parse_error(raw: &str, reason: impl ToString) -> TimestampParseError {
    TimestampParseError {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

/// Collect up to `limit` non-null values of `column` with their normalized form.
pub fn preview_values(column: &str, rows: &[Row], limit: usize) -> Vec<TimestampPreview> {
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter(|v| !v.is_null())
        .take(limit)
        .map(|v| TimestampPreview {
            raw: v.to_string(),
            normalized: try_normalize(v).ok().flatten(),
        })
        .collect()
}

/// Let the user pick and confirm the timestamp column.
///
/// The guessed column is offered as default; the prompter answers with the default or a
/// 0-based column position. Invalid answers are re-asked. After a choice, a preview of up to
/// `preview_limit` values is shown and must be confirmed, otherwise selection starts over.
///
/// Returns `Ok(None)` when there are no sample rows to choose from.
pub fn select_column(
    columns: &[String],
    sample_rows: &[Row],
    preview_limit: usize,
    prompter: &mut dyn Prompter,
) -> LoaderResult<Option<String>> {
    let Some(first) = sample_rows.first() else {
        tracing::warn!("input has no rows; cannot determine timestamp column");
        return Ok(None);
    };

    let samples: Vec<ColumnSample> = columns
        .iter()
        .enumerate()
        .map(|(position, name)| ColumnSample {
            position,
            name: name.clone(),
            sample: first.get(name).cloned().unwrap_or(Value::Null),
        })
        .collect();
    let suggested = guess_column(columns);

    loop {
        let selected = match prompter.timestamp_column(&samples, suggested)? {
            ColumnChoice::Suggested => match suggested {
                Some(col) => col.to_string(),
                None => {
                    tracing::warn!("no suggested timestamp column; choose one explicitly");
                    continue;
                }
            },
            ColumnChoice::Position(idx) => match columns.get(idx) {
                Some(col) => col.clone(),
                None => {
                    tracing::warn!(position = idx, columns = columns.len(), "invalid column selection");
                    continue;
                }
            },
        };

        let previews = preview_values(&selected, sample_rows, preview_limit);
        if prompter.confirm_timestamp(&selected, &previews)? {
            return Ok(Some(selected));
        }
    }
}
