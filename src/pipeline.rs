//! End-to-end load of one CSV file into an existing index.
//!
//! The pass is: read the header, resolve the timestamp column (on buffered sample rows when
//! asking a human), stream every row into a bulk artifact, then deliver the artifact in chunks
//! and delete it.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{LoaderError, LoaderResult};
use crate::execution::{ChunkedUploader, UploadObserver, UploadOptions, UploadOutcome};
use crate::ingestion::{csv_rows_from_reader, BulkDocumentStreamer, CsvRows};
use crate::interaction::Prompter;
use crate::processing::{guess_column, select_column};
use crate::store::{ConnectedSession, StoreTransport};
use crate::types::Row;

/// How the timestamp column is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimestampSelection {
    /// Take the best match of the column-name priority list, if any.
    #[default]
    Guess,
    /// Use this column. Accepts the name as written in the file or its prepared form.
    Named(String),
    /// Ask the [`Prompter`], previewing normalized sample values.
    Interactive,
    /// Do not add a normalized timestamp.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub timestamp: TimestampSelection,
    /// Rows buffered for the interactive column choice.
    pub sample_rows: usize,
    /// Values shown when confirming the interactive choice.
    pub preview_limit: usize,
    /// Directory for the bulk artifact; the system temp dir when `None`.
    pub artifact_dir: Option<PathBuf>,
    pub upload: UploadOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timestamp: TimestampSelection::default(),
            sample_rows: 100,
            preview_limit: 5,
            artifact_dir: None,
            upload: UploadOptions::default(),
        }
    }
}

/// What a load did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub index: String,
    /// Rows written to the artifact.
    pub rows: usize,
    /// Input records skipped as malformed.
    pub skipped_records: usize,
    /// Prepared name of the timestamp column, if one was used.
    pub timestamp_column: Option<String>,
    pub timestamps_normalized: usize,
    pub timestamps_failed: usize,
    pub upload: UploadOutcome,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.upload.is_success()
    }
}

/// Load the CSV file at `path` into `index`.
pub fn load_csv<T: StoreTransport + ?Sized>(
    transport: &T,
    session: &ConnectedSession,
    path: impl AsRef<Path>,
    index: &str,
    prompter: &mut dyn Prompter,
    observer: &dyn UploadObserver,
    options: &LoadOptions,
) -> LoaderResult<LoadReport> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), index, "loading csv");
    let file = std::fs::File::open(path)?;
    load_csv_from_reader(transport, session, file, index, prompter, observer, options)
}

/// Load CSV bytes from any reader into `index`.
pub fn load_csv_from_reader<T: StoreTransport + ?Sized, R: Read>(
    transport: &T,
    session: &ConnectedSession,
    source: R,
    index: &str,
    prompter: &mut dyn Prompter,
    observer: &dyn UploadObserver,
    options: &LoadOptions,
) -> LoaderResult<LoadReport> {
    if index.trim().is_empty() {
        return Err(LoaderError::InvalidOptions {
            message: "target index name is empty".to_string(),
        });
    }
    let uploader = ChunkedUploader::new(transport, session, options.upload.clone())?;

    let mut rows = csv_rows_from_reader(source)?;
    let headers = rows.headers().to_vec();

    let mut sample = Vec::new();
    let timestamp_column = match &options.timestamp {
        TimestampSelection::Disabled => None,
        TimestampSelection::Guess => guess_column(headers.as_slice()).map(str::to_string),
        TimestampSelection::Named(name) => Some(resolve_named(&rows, name)?),
        TimestampSelection::Interactive => {
            sample = rows
                .by_ref()
                .take(options.sample_rows.max(1))
                .collect::<LoaderResult<Vec<Row>>>()?;
            select_column(&headers, &sample, options.preview_limit, prompter)?
        }
    };
    match &timestamp_column {
        Some(column) => tracing::info!(column = %column, "using timestamp column"),
        None => tracing::info!("no timestamp column; documents carry no normalized timestamp"),
    }

    let streamer = BulkDocumentStreamer::new(index, timestamp_column.as_deref())?;
    let dir = options
        .artifact_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let artifact =
        streamer.write_artifact(sample.into_iter().map(Ok).chain(rows.by_ref()), &dir, "bulk_")?;
    let stats = artifact.stats();
    let skipped_records = rows.skipped();
    tracing::info!(
        rows = stats.rows,
        skipped = skipped_records,
        timestamps_failed = stats.timestamps_failed,
        "prepared bulk artifact"
    );

    let upload = uploader.upload_artifact(artifact, index, observer)?;

    Ok(LoadReport {
        index: index.to_string(),
        rows: stats.rows,
        skipped_records,
        timestamp_column,
        timestamps_normalized: stats.timestamps_normalized,
        timestamps_failed: stats.timestamps_failed,
        upload,
    })
}

fn resolve_named<R>(rows: &CsvRows<R>, name: &str) -> LoaderResult<String> {
    if let Some(prepared) = rows.headers().iter().find(|h| *h == name) {
        return Ok(prepared.clone());
    }
    rows.raw_headers()
        .iter()
        .position(|raw| raw == name)
        .and_then(|pos| rows.headers().get(pos))
        .cloned()
        .ok_or_else(|| LoaderError::UnknownColumn {
            column: name.to_string(),
        })
}
