use std::path::PathBuf;

use thiserror::Error;

use crate::item::ItemId;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Session log I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing stimulus for item {item} at {}: {reason}", .path.display())]
    MissingAsset {
        item: ItemId,
        path: PathBuf,
        reason: String,
    },

    #[error("Malformed log record: {0}")]
    MalformedRecord(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Session aborted by operator")]
    Aborted,
}

impl ExperimentError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised before anything was presented or written.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
