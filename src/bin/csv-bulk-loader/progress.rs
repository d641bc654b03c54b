use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use csv_bulk_loader::execution::{
    ChunkFailure, ChunkReport, DeliveryError, UploadObserver, UploadOutcome,
};

/// Renders upload progress as a bar of delivered documents.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(quiet: bool) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        if quiet {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_prefix("Uploading");
        Self { bar }
    }
}

impl UploadObserver for ProgressObserver {
    fn on_started(&self, expected_rows: Option<usize>) {
        let style = match expected_rows {
            Some(rows) => {
                self.bar.set_length(rows as u64);
                ProgressStyle::with_template(
                    "{prefix:10} {spinner:.dim} [{bar:25}] {pos}/{len} docs  {msg}",
                )
            }
            None => ProgressStyle::with_template("{prefix:10} {spinner:.dim} {pos} docs  {msg}"),
        };
        if let Ok(style) = style {
            self.bar
                .set_style(style.tick_strings(&["|", "/", "-", "\\", " "]).progress_chars("=>-"));
        }
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn on_chunk_delivered(&self, report: &ChunkReport) {
        self.bar.inc(report.actions as u64);
        if report.item_errors.is_empty() {
            self.bar.set_message(format!("chunk {}", report.sequence + 1));
        } else {
            self.bar.set_message(format!(
                "chunk {}: {} documents rejected",
                report.sequence + 1,
                report.item_errors.len()
            ));
        }
    }

    fn on_chunk_retry(&self, sequence: usize, attempt: u32, _error: &DeliveryError) {
        self.bar
            .set_message(format!("chunk {}: retrying (attempt {attempt} failed)", sequence + 1));
    }

    fn on_chunk_failed(&self, failure: &ChunkFailure) {
        self.bar.abandon_with_message(format!(
            "chunk {} failed after {} attempts",
            failure.sequence + 1,
            failure.attempts
        ));
    }

    fn on_finished(&self, outcome: &UploadOutcome) {
        if outcome.is_success() {
            self.bar.finish_with_message(format!(
                "{} chunks delivered",
                outcome.chunks_delivered
            ));
        }
    }
}
