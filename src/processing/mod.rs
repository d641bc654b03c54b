//! Pure row transforms applied between reading and streaming.
//!
//! - [`columns`]: header deduplication and field-name sanitization
//! - [`clean`]: replacement of NaN/±Infinity with null at any nesting depth
//! - [`timestamp`]: timestamp column guessing/selection and value normalization
//!
//! ## Example: normalize a row
//!
//! ```rust
//! use csv_bulk_loader::processing::{apply_timestamp, clean_row, normalize, prepare_headers};
//! use csv_bulk_loader::types::{Row, Value, TIMESTAMP_FIELD};
//!
//! let headers = prepare_headers(&["id", "id", "ts"], &[TIMESTAMP_FIELD]);
//! assert_eq!(headers, vec!["id", "id_1", "ts"]);
//!
//! let mut row = Row::from_pairs(
//!     headers
//!         .iter()
//!         .cloned()
//!         .zip([Value::Int(1), Value::Float(f64::NAN), Value::Str("1700000000".into())]),
//! );
//! clean_row(&mut row);
//! let instant = normalize(row.get("ts").unwrap());
//! apply_timestamp(&mut row, instant);
//!
//! assert_eq!(row.get("id_1"), Some(&Value::Null));
//! assert_eq!(
//!     row.get(TIMESTAMP_FIELD),
//!     Some(&Value::Str("2023-11-14T22:13:20Z".into()))
//! );
//! ```

pub mod clean;
pub mod columns;
pub mod timestamp;

use crate::types::{NormalizedInstant, Row, Value, TIMESTAMP_FIELD};

pub use clean::{clean_in_place, clean_row, clean_value};
pub use columns::{deduplicate_columns, prepare_headers, sanitize_column_name};
pub use timestamp::{guess_column, normalize, preview_values, select_column, try_normalize};

/// Store `instant` under [`TIMESTAMP_FIELD`], leaving the source column untouched.
///
/// Does nothing when `instant` is `None`.
pub fn apply_timestamp(row: &mut Row, instant: Option<NormalizedInstant>) {
    if let Some(instant) = instant {
        row.insert(TIMESTAMP_FIELD, Value::Str(instant.into_string()));
    }
}
