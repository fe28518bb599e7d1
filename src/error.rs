use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the mixdown-core crate.
#[derive(Debug, Error)]
pub enum MixError {
    /// Required input missing or out of range. Raised before any I/O.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Remote fetch answered with a non-2xx status.
    #[error("Download failed: {status} ({url})")]
    Download { status: u16, url: String },

    /// Remote fetch failed at the transport level.
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The processing engine reported a failure while running the graph.
    #[error("Processing failed: {message}")]
    Processing { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MixError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        MixError::InputValidation(msg.into())
    }

    /// Download and network failures may succeed on retry; the rest won't.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MixError::Download { .. } | MixError::Network { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            MixError::Download { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure while removing a temp or partial file. Never propagated: callers
/// log it and carry on with the primary result.
#[derive(Debug, Error)]
#[error("Failed to remove {}: {source}", path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

pub type Result<T> = std::result::Result<T, MixError>;
