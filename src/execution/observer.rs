use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::upload::{ChunkFailure, ChunkReport, DeliveryError, UploadOutcome};

/// Hooks for upload progress.
///
/// Every method defaults to a no-op so implementors only override what they display.
pub trait UploadObserver: Send + Sync {
    /// `expected_rows` is known when uploading an artifact.
    fn on_started(&self, _expected_rows: Option<usize>) {}
    fn on_chunk_delivered(&self, _report: &ChunkReport) {}
    /// A failed attempt that will be retried.
    fn on_chunk_retry(&self, _sequence: usize, _attempt: u32, _error: &DeliveryError) {}
    fn on_chunk_failed(&self, _failure: &ChunkFailure) {}
    fn on_finished(&self, _outcome: &UploadOutcome) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl UploadObserver for SilentObserver {}

/// Running counters of an upload, updated through [`UploadObserver`].
pub struct UploadMetrics {
    started_at: Mutex<Option<Instant>>,
    elapsed_ns: AtomicU64,
    chunks_delivered: AtomicU64,
    actions_delivered: AtomicU64,
    item_failures: AtomicU64,
    retries: AtomicU64,
    chunks_failed: AtomicU64,
}

impl UploadMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Mutex::new(None),
            elapsed_ns: AtomicU64::new(0),
            chunks_delivered: AtomicU64::new(0),
            actions_delivered: AtomicU64::new(0),
            item_failures: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            chunks_failed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> UploadMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        UploadMetricsSnapshot {
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            chunks_delivered: self.chunks_delivered.load(Ordering::SeqCst),
            actions_delivered: self.actions_delivered.load(Ordering::SeqCst),
            item_failures: self.item_failures.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
            chunks_failed: self.chunks_failed.load(Ordering::SeqCst),
        }
    }
}

impl Default for UploadMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadObserver for UploadMetrics {
    fn on_started(&self, _expected_rows: Option<usize>) {
        if let Ok(mut started) = self.started_at.lock() {
            *started = Some(Instant::now());
        }
        for counter in [
            &self.elapsed_ns,
            &self.chunks_delivered,
            &self.actions_delivered,
            &self.item_failures,
            &self.retries,
            &self.chunks_failed,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    fn on_chunk_delivered(&self, report: &ChunkReport) {
        self.chunks_delivered.fetch_add(1, Ordering::SeqCst);
        self.actions_delivered
            .fetch_add(report.actions as u64, Ordering::SeqCst);
        self.item_failures
            .fetch_add(report.item_errors.len() as u64, Ordering::SeqCst);
    }

    fn on_chunk_retry(&self, _sequence: usize, _attempt: u32, _error: &DeliveryError) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    fn on_chunk_failed(&self, _failure: &ChunkFailure) {
        self.chunks_failed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_finished(&self, _outcome: &UploadOutcome) {
        let started = self.started_at.lock().ok().and_then(|s| *s);
        if let Some(started) = started {
            let ns = started.elapsed().as_nanos().min(u64::MAX as u128) as u64;
            self.elapsed_ns.store(ns.max(1), Ordering::SeqCst);
        }
    }
}

/// Immutable snapshot of [`UploadMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetricsSnapshot {
    pub elapsed: Option<Duration>,
    pub chunks_delivered: u64,
    pub actions_delivered: u64,
    pub item_failures: u64,
    pub retries: u64,
    pub chunks_failed: u64,
}

impl fmt::Display for UploadMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunks={}, actions={}, item_failures={}, retries={}, failed_chunks={}, elapsed={:?}",
            self.chunks_delivered,
            self.actions_delivered,
            self.item_failures,
            self.retries,
            self.chunks_failed,
            self.elapsed
        )
    }
}
