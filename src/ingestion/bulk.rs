//! Conversion of rows into bulk action/document line pairs.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::json;
use tempfile::NamedTempFile;

use crate::error::LoaderResult;
use crate::processing::{apply_timestamp, clean_row, try_normalize};
use crate::types::Row;

/// Counters of one streaming pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Rows written (each as one action/document pair).
    pub rows: usize,
    pub timestamps_normalized: usize,
    /// Rows whose timestamp value was present but unparseable; they are still written.
    pub timestamps_failed: usize,
}

/// Writes `{"index":{"_index":…}}` + document line pairs, one row at a time.
#[derive(Debug, Clone)]
pub struct BulkDocumentStreamer {
    action_line: String,
    timestamp_column: Option<String>,
}

impl BulkDocumentStreamer {
    pub fn new(index: &str, timestamp_column: Option<&str>) -> LoaderResult<Self> {
        let action_line = serde_json::to_string(&json!({ "index": { "_index": index } }))?;
        Ok(Self {
            action_line,
            timestamp_column: timestamp_column.map(str::to_string),
        })
    }

    /// Clean, timestamp and serialize every row into `out`.
    ///
    /// Each row is cleaned (non-finite numbers → null) and, when a timestamp column is set, its
    /// value is normalized into `timestamp_field`. Unparseable timestamps are logged and the row
    /// is written without the field.
    pub fn stream<I, W>(&self, rows: I, mut out: W) -> LoaderResult<StreamStats>
    where
        I: IntoIterator<Item = LoaderResult<Row>>,
        W: Write,
    {
        let mut stats = StreamStats::default();
        for row in rows {
            let mut row = row?;
            clean_row(&mut row);

            if let Some(column) = self.timestamp_column.as_deref() {
                if let Some(raw) = row.get(column) {
                    match try_normalize(raw) {
                        Ok(Some(instant)) => {
                            apply_timestamp(&mut row, Some(instant));
                            stats.timestamps_normalized += 1;
                        }
                        Ok(None) => {}
                        Err(err) => {
                            tracing::warn!(
                                row = stats.rows + 1,
                                raw = %err.raw,
                                reason = %err.reason,
                                "failed to parse timestamp; writing row without it"
                            );
                            stats.timestamps_failed += 1;
                        }
                    }
                }
            }

            out.write_all(self.action_line.as_bytes())?;
            out.write_all(b"\n")?;
            serde_json::to_writer(&mut out, &row)?;
            out.write_all(b"\n")?;
            stats.rows += 1;
        }
        out.flush()?;
        Ok(stats)
    }

    /// Stream `rows` into a new temporary artifact inside `dir`.
    pub fn write_artifact<I>(&self, rows: I, dir: &Path, prefix: &str) -> LoaderResult<BulkArtifact>
    where
        I: IntoIterator<Item = LoaderResult<Row>>,
    {
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".ndjson")
            .tempfile_in(dir)?;
        let stats = self.stream(rows, BufWriter::new(&mut file))?;
        tracing::debug!(path = %file.path().display(), rows = stats.rows, "wrote bulk artifact");
        Ok(BulkArtifact { file, stats })
    }
}

/// Transient newline-delimited bulk file.
///
/// Removed by [`BulkArtifact::delete`], or on drop if never deleted explicitly.
#[derive(Debug)]
pub struct BulkArtifact {
    file: NamedTempFile,
    stats: StreamStats,
}

impl BulkArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Number of lines in the file (two per row).
    pub fn line_count(&self) -> usize {
        self.stats.rows * 2
    }

    /// Fresh reader positioned at the start of the file.
    pub fn reader(&self) -> LoaderResult<BufReader<File>> {
        Ok(BufReader::new(self.file.reopen()?))
    }

    pub fn delete(self) -> LoaderResult<()> {
        self.file.close()?;
        Ok(())
    }
}
