//! Interaction interface used by the core when a human decision is needed.
//!
//! The core never reads a terminal. Recovery prompts (endpoint/credential re-entry) and the
//! timestamp column choice are delegated to a [`Prompter`]; the binary ships a terminal
//! implementation, tests use scripted ones, and [`NonInteractive`] fails every question so
//! unattended runs stop instead of blocking.

use crate::error::{LoaderError, LoaderResult};
use crate::store::Credentials;
use crate::types::{NormalizedInstant, Value};

/// One header column with its first-row value, shown when choosing the timestamp column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSample {
    /// 0-based position in the prepared header.
    pub position: usize,
    pub name: String,
    pub sample: Value,
}

/// Answer to the timestamp column question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnChoice {
    /// Accept the suggested (guessed) column.
    Suggested,
    /// Pick the column at this 0-based position.
    Position(usize),
}

/// A sample value of the chosen timestamp column and how it would be normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampPreview {
    pub raw: String,
    pub normalized: Option<NormalizedInstant>,
}

/// Source of human answers.
pub trait Prompter {
    /// Ask for a new store endpoint after `current` failed for `reason`.
    fn endpoint(&mut self, current: &str, reason: &str) -> LoaderResult<String>;

    /// Ask for new credentials after `endpoint` rejected the current ones.
    fn credentials(&mut self, endpoint: &str) -> LoaderResult<Credentials>;

    /// Ask which column holds timestamps.
    fn timestamp_column(
        &mut self,
        columns: &[ColumnSample],
        suggested: Option<&str>,
    ) -> LoaderResult<ColumnChoice>;

    /// Ask whether `column` is the right choice, given normalized samples.
    fn confirm_timestamp(
        &mut self,
        column: &str,
        previews: &[TimestampPreview],
    ) -> LoaderResult<bool>;
}

/// A prompter for unattended runs: every question is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl NonInteractive {
    fn refuse(question: &str) -> LoaderError {
        LoaderError::Interaction {
            message: format!("{question} requires interactive input"),
        }
    }
}

impl Prompter for NonInteractive {
    fn endpoint(&mut self, current: &str, reason: &str) -> LoaderResult<String> {
        Err(Self::refuse(&format!(
            "endpoint '{current}' is unusable ({reason}); re-entering it"
        )))
    }

    fn credentials(&mut self, endpoint: &str) -> LoaderResult<Credentials> {
        Err(Self::refuse(&format!(
            "authentication against '{endpoint}' failed; re-entering credentials"
        )))
    }

    fn timestamp_column(
        &mut self,
        _columns: &[ColumnSample],
        _suggested: Option<&str>,
    ) -> LoaderResult<ColumnChoice> {
        Err(Self::refuse("choosing the timestamp column"))
    }

    fn confirm_timestamp(
        &mut self,
        _column: &str,
        _previews: &[TimestampPreview],
    ) -> LoaderResult<bool> {
        Err(Self::refuse("confirming the timestamp column"))
    }
}
