//! Input reading and bulk artifact production.
//!
//! - [`csv`]: streaming CSV reader yielding schema-less [`crate::types::Row`]s
//! - [`bulk`]: [`BulkDocumentStreamer`], which turns rows into action/document line pairs
//!   written incrementally to a [`BulkArtifact`]

pub mod bulk;
pub mod csv;

pub use bulk::{BulkArtifact, BulkDocumentStreamer, StreamStats};
pub use csv::{csv_rows_from_reader, open_csv, parse_cell, CsvRows};
