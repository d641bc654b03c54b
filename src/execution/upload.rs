//! Chunked, ordered delivery of a bulk line stream.

use std::io::{BufRead, Lines};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::error::{LoaderError, LoaderResult, TransportError};
use crate::ingestion::BulkArtifact;
use crate::store::{ConnectedSession, StoreRequest, StoreTransport};

use super::observer::UploadObserver;
use super::retry::{Attempts, RetryPolicy};

/// Default lines per bulk request (5,000 action/document pairs).
pub const DEFAULT_CHUNK_LINES: usize = 10_000;

/// Options for [`ChunkedUploader`].
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Lines per chunk. Rounded down to an even number so pairs are never split; must be >= 2.
    pub chunk_line_count: usize,
    /// Attempts per chunk and the delay between them.
    pub retry: RetryPolicy,
    /// Timeout of a single bulk request.
    pub request_timeout: Option<Duration>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_line_count: DEFAULT_CHUNK_LINES,
            retry: RetryPolicy::default(),
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl UploadOptions {
    pub fn validate(&self) -> LoaderResult<()> {
        if self.chunk_line_count < 2 {
            return Err(LoaderError::InvalidOptions {
                message: format!(
                    "chunk_line_count must be >= 2 (got {})",
                    self.chunk_line_count
                ),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(LoaderError::InvalidOptions {
                message: "retry.max_attempts must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

/// A run of complete action/document pairs, ready to be sent as one bulk body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadChunk {
    /// 0-based position of the chunk in the stream.
    pub sequence: usize,
    /// Number of action/document pairs.
    pub actions: usize,
    /// Newline-terminated NDJSON body.
    pub body: String,
}

impl UploadChunk {
    pub fn line_count(&self) -> usize {
        self.actions * 2
    }
}

/// Splits a bulk line stream into [`UploadChunk`]s on pair boundaries.
///
/// Blank lines are ignored. A trailing action line without a document is an error.
pub struct ChunkReader<R> {
    lines: Lines<R>,
    pairs_per_chunk: usize,
    line_no: usize,
    next_sequence: usize,
    done: bool,
}

impl<R: BufRead> ChunkReader<R> {
    /// `chunk_line_count` is rounded down to an even number (minimum one pair).
    pub fn new(reader: R, chunk_line_count: usize) -> Self {
        Self {
            lines: reader.lines(),
            pairs_per_chunk: (chunk_line_count / 2).max(1),
            line_no: 0,
            next_sequence: 0,
            done: false,
        }
    }

    fn next_line(&mut self) -> Option<LoaderResult<String>> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            match line {
                Ok(l) if l.trim().is_empty() => continue,
                Ok(l) => return Some(Ok(l)),
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

impl<R: BufRead> Iterator for ChunkReader<R> {
    type Item = LoaderResult<UploadChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut body = String::new();
        let mut actions = 0;
        while actions < self.pairs_per_chunk {
            let action = match self.next_line() {
                None => break,
                Some(Ok(l)) => l,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let document = match self.next_line() {
                Some(Ok(l)) => l,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return Some(Err(LoaderError::MalformedArtifact {
                        line: self.line_no,
                        message: "action line without a document line".to_string(),
                    }));
                }
            };
            body.push_str(&action);
            body.push('\n');
            body.push_str(&document);
            body.push('\n');
            actions += 1;
        }

        if actions == 0 {
            self.done = true;
            return None;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Some(Ok(UploadChunk {
            sequence,
            actions,
            body,
        }))
    }
}

/// Why a single delivery attempt failed. Every variant is retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("bulk request returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable bulk response: {0}")]
    Response(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Per-chunk result of a delivered chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkReport {
    pub sequence: usize,
    pub actions: usize,
    pub attempts: u32,
    /// Error objects of items the store rejected; the chunk still counts as delivered.
    pub item_errors: Vec<serde_json::Value>,
}

/// The chunk that exhausted its attempts and stopped the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    pub sequence: usize,
    pub attempts: u32,
    pub last_error: String,
}

/// Summary of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    pub chunks_delivered: usize,
    pub actions_delivered: usize,
    /// Items rejected inside delivered chunks.
    pub item_failures: usize,
    /// Set when a chunk ran out of attempts; later chunks were not sent.
    pub failure: Option<ChunkFailure>,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Sends a bulk line stream to `<index>/_bulk` in ordered, bounded chunks.
///
/// Chunks go out strictly one after another. A chunk is retried on transport errors, non-2xx
/// statuses and unreadable responses; a 2xx response that reports per-item errors is logged and
/// accepted. The first chunk to exhaust its attempts stops the upload.
pub struct ChunkedUploader<'a, T: ?Sized> {
    transport: &'a T,
    session: &'a ConnectedSession,
    options: UploadOptions,
}

impl<'a, T: StoreTransport + ?Sized> ChunkedUploader<'a, T> {
    pub fn new(
        transport: &'a T,
        session: &'a ConnectedSession,
        options: UploadOptions,
    ) -> LoaderResult<Self> {
        options.validate()?;
        Ok(Self {
            transport,
            session,
            options,
        })
    }

    /// Upload the artifact, then delete it whatever the outcome.
    pub fn upload_artifact(
        &self,
        artifact: BulkArtifact,
        index: &str,
        observer: &dyn UploadObserver,
    ) -> LoaderResult<UploadOutcome> {
        observer.on_started(Some(artifact.stats().rows));
        let result = artifact
            .reader()
            .and_then(|reader| self.upload_chunks(reader, index, observer));
        let path = artifact.path().to_path_buf();
        if let Err(err) = artifact.delete() {
            tracing::warn!(path = %path.display(), error = %err, "failed to delete bulk artifact");
        }
        result
    }

    /// Upload an NDJSON bulk stream.
    pub fn upload<R: BufRead>(
        &self,
        stream: R,
        index: &str,
        observer: &dyn UploadObserver,
    ) -> LoaderResult<UploadOutcome> {
        observer.on_started(None);
        self.upload_chunks(stream, index, observer)
    }

    fn upload_chunks<R: BufRead>(
        &self,
        stream: R,
        index: &str,
        observer: &dyn UploadObserver,
    ) -> LoaderResult<UploadOutcome> {
        let path = format!("{index}/_bulk");
        let mut outcome = UploadOutcome::default();

        for chunk in ChunkReader::new(stream, self.options.chunk_line_count) {
            let chunk = chunk?;
            let request = StoreRequest::post_ndjson(path.as_str(), chunk.body)
                .with_timeout(self.options.request_timeout);

            let result = self.options.retry.run(
                |_| self.deliver(&request),
                |attempt, err, next_delay| {
                    tracing::warn!(
                        chunk = chunk.sequence + 1,
                        attempt,
                        error = %err,
                        retry_in = ?next_delay,
                        "chunk upload failed"
                    );
                    if next_delay.is_some() {
                        observer.on_chunk_retry(chunk.sequence, attempt, err);
                    }
                },
            );

            match result {
                Ok(Attempts {
                    value: item_errors,
                    attempts,
                }) => {
                    if attempts > 1 {
                        tracing::info!(chunk = chunk.sequence + 1, attempts, "retry successful");
                    }
                    for error in &item_errors {
                        tracing::warn!(chunk = chunk.sequence + 1, error = %error, "item failed to index");
                    }
                    outcome.chunks_delivered += 1;
                    outcome.actions_delivered += chunk.actions;
                    outcome.item_failures += item_errors.len();
                    observer.on_chunk_delivered(&ChunkReport {
                        sequence: chunk.sequence,
                        actions: chunk.actions,
                        attempts,
                        item_errors,
                    });
                }
                Err(Attempts {
                    value: err,
                    attempts,
                }) => {
                    tracing::error!(
                        chunk = chunk.sequence + 1,
                        attempts,
                        error = %err,
                        "giving up on chunk after repeated failures"
                    );
                    let failure = ChunkFailure {
                        sequence: chunk.sequence,
                        attempts,
                        last_error: err.to_string(),
                    };
                    observer.on_chunk_failed(&failure);
                    outcome.failure = Some(failure);
                    break;
                }
            }
        }

        if outcome.is_success() {
            tracing::info!(
                chunks = outcome.chunks_delivered,
                actions = outcome.actions_delivered,
                item_failures = outcome.item_failures,
                "all chunks uploaded"
            );
        } else {
            tracing::error!(
                chunks = outcome.chunks_delivered,
                "upload completed with errors"
            );
        }
        observer.on_finished(&outcome);
        Ok(outcome)
    }

    /// One attempt: returns the error objects of rejected items on success.
    fn deliver(&self, request: &StoreRequest) -> Result<Vec<serde_json::Value>, DeliveryError> {
        let resp = self.transport.send(self.session.session(), request)?;
        if !matches!(resp.status, 200 | 201) {
            return Err(DeliveryError::Status {
                status: resp.status,
                body: resp.body,
            });
        }
        let parsed: BulkResponse = serde_json::from_str(&resp.body)?;
        if !parsed.errors {
            return Ok(Vec::new());
        }
        Ok(parsed
            .items
            .into_iter()
            .flat_map(|item| item.into_iter().map(|(_, result)| result))
            .filter_map(|result| result.get("error").cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{ChunkReader, UploadOptions};
    use crate::error::LoaderError;

    fn pairs(n: usize) -> String {
        (0..n)
            .map(|i| format!("{{\"index\":{{}}}}\n{{\"n\":{i}}}\n"))
            .collect()
    }

    #[test]
    fn chunks_hold_whole_pairs_for_any_size() {
        let input = pairs(7);
        for size in 2..=16 {
            let chunks: Vec<_> = ChunkReader::new(Cursor::new(input.as_bytes()), size)
                .collect::<Result<_, _>>()
                .unwrap();
            let total: usize = chunks.iter().map(|c| c.actions).sum();
            assert_eq!(total, 7, "size {size}");
            for c in &chunks {
                assert_eq!(c.body.lines().count() % 2, 0);
                assert!(c.line_count() <= size);
                let mut lines = c.body.lines();
                while let (Some(action), Some(doc)) = (lines.next(), lines.next()) {
                    assert!(action.starts_with("{\"index\""));
                    assert!(doc.starts_with("{\"n\""));
                }
            }
        }
    }

    #[test]
    fn sequence_numbers_follow_stream_order() {
        let input = pairs(5);
        let seq: Vec<usize> = ChunkReader::new(Cursor::new(input.as_bytes()), 4)
            .map(|c| c.unwrap().sequence)
            .collect();
        assert_eq!(seq, vec![0, 1, 2]);
    }

    #[test]
    fn dangling_action_line_is_rejected() {
        let input = format!("{}{{\"index\":{{}}}}\n", pairs(1));
        let results: Vec<_> = ChunkReader::new(Cursor::new(input.as_bytes()), 10).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(LoaderError::MalformedArtifact { line: 3, .. })
        ));
    }

    #[test]
    fn options_reject_tiny_chunks() {
        let opts = UploadOptions {
            chunk_line_count: 1,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn default_chunk_holds_five_thousand_pairs() {
        let input = pairs(5_001);
        let opts = UploadOptions::default();
        let sizes: Vec<usize> = ChunkReader::new(Cursor::new(input.as_bytes()), opts.chunk_line_count)
            .map(|c| c.unwrap().actions)
            .collect();
        assert_eq!(sizes, vec![5_000, 1]);
    }
}
