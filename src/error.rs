use thiserror::Error;

/// Convenience result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Error type returned by loader functions.
///
/// This is a single error enum shared across reading, streaming, index management and upload.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Underlying I/O error (e.g. file not found, artifact write failure).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding/decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store could not be reached (connection refused, timeout, TLS failure).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The store rejected an index creation request.
    #[error("failed to create index '{index}': status {status}: {body}")]
    IndexCreation { index: String, status: u16, body: String },

    /// The store rejected an index deletion request.
    #[error("failed to delete index '{index}': status {status}: {body}")]
    IndexDeletion { index: String, status: u16, body: String },

    /// The store rejected the index listing request.
    #[error("failed to list indices: status {status}: {body}")]
    IndexListing { status: u16, body: String },

    /// Connection config could not be read or is incomplete.
    #[error("config error: {message}")]
    Config { message: String },

    /// Caller-supplied options are out of range.
    #[error("invalid options: {message}")]
    InvalidOptions { message: String },

    /// A bulk artifact line pair is incomplete.
    #[error("malformed bulk artifact at line {line}: {message}")]
    MalformedArtifact { line: usize, message: String },

    /// The interaction collaborator failed (e.g. stdin closed).
    #[error("interaction failed: {message}")]
    Interaction { message: String },

    /// A named column does not exist in the input header.
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },
}

/// Error raised by a [`crate::store::StoreTransport`] when a request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A raw timestamp value could not be converted into an instant.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unparseable timestamp '{raw}': {reason}")]
pub struct TimestampParseError {
    pub raw: String,
    pub reason: String,
}
