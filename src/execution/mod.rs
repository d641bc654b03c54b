//! Delivery of bulk artifacts to the store.
//!
//! This module sits "above" [`crate::ingestion`] and provides:
//!
//! - Pair-preserving chunking of the bulk line stream ([`ChunkReader`])
//! - Ordered chunk delivery with bounded retry ([`ChunkedUploader`], [`RetryPolicy`])
//! - Progress hooks and counters for monitoring ([`UploadObserver`], [`UploadMetrics`])

mod observer;
mod retry;
mod upload;

pub use observer::{SilentObserver, UploadMetrics, UploadMetricsSnapshot, UploadObserver};
pub use retry::{Attempts, Backoff, RetryPolicy};
pub use upload::{
    ChunkFailure, ChunkReader, ChunkReport, ChunkedUploader, DeliveryError, UploadChunk,
    UploadOptions, UploadOutcome, DEFAULT_CHUNK_LINES,
};
