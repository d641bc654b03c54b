//! `csv-bulk-loader` streams a delimited tabular file into a search/index store through its bulk
//! write API.
//!
//! The primary entrypoint is [`pipeline::load_csv`]: it reads the CSV one record at a time,
//! normalizes a timestamp column into `timestamp_field`, writes action/document line pairs to a
//! transient artifact and delivers that artifact in ordered, retried chunks.
//!
//! ## What a load does
//!
//! - **Columns**: duplicate headers get `_1`, `_2`, … suffixes and are sanitized to
//!   `[A-Za-z0-9_@#]` (see [`processing::prepare_headers`]).
//! - **Values**: each cell is typed on its own; NA tokens become null and NaN/±Infinity are
//!   replaced with null before serialization (see [`processing::clean_value`]).
//! - **Timestamps**: epoch seconds, epoch milliseconds (13+ digits), ISO-8601 and common textual
//!   layouts are normalized to UTC ISO-8601 with a trailing `Z`. Unparseable values are logged and
//!   the row is still loaded.
//! - **Delivery**: chunks never split an action/document pair, go out strictly in order and are
//!   retried on connectivity or status failures. The first chunk that exhausts its attempts stops
//!   the upload. The artifact is deleted either way.
//!
//! Every store operation requires a [`store::ConnectedSession`], obtained from
//! [`store::ensure_connected`].
//!
//! ## Quick example
//!
//! ```no_run
//! use csv_bulk_loader::config::FileConfigStore;
//! use csv_bulk_loader::execution::SilentObserver;
//! use csv_bulk_loader::interaction::NonInteractive;
//! use csv_bulk_loader::pipeline::{load_csv, LoadOptions};
//! use csv_bulk_loader::store::{
//!     ensure_connected, Credentials, HttpTransport, HttpTransportOptions, IndexManager, Session,
//! };
//!
//! # fn main() -> Result<(), csv_bulk_loader::LoaderError> {
//! let transport = HttpTransport::new(&HttpTransportOptions::default())?;
//! let session = Session::new("https://localhost:9200", Credentials::new("elastic", "changeme"));
//! let session = ensure_connected(
//!     &transport,
//!     session,
//!     &mut NonInteractive,
//!     &FileConfigStore::new("elk-config.txt"),
//! )?;
//!
//! let index = IndexManager::new(&transport, &session).create_with_mapping("Incident Report")?;
//! let report = load_csv(
//!     &transport,
//!     &session,
//!     "incidents.csv",
//!     &index,
//!     &mut NonInteractive,
//!     &SilentObserver,
//!     &LoadOptions::default(),
//! )?;
//! println!("rows={} delivered={}", report.rows, report.upload.actions_delivered);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod interaction;
pub mod pipeline;
pub mod processing;
pub mod store;
pub mod types;

pub use error::{LoaderError, LoaderResult};
